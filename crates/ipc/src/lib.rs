mod channel;
mod codec;
mod error;

pub use channel::{ReadEnd, WriteEnd, pipe};
pub use codec::{FRAME_LEN, decode, encode, read_frame, write_frame};
pub use error::IpcError;
