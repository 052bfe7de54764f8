use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use roomer_core::error::{RelayError, Result};

/// A TCP stream framed into `\n`-terminated lines (a trailing `\r` is dropped).
pub type Lines = Framed<TcpStream, LinesCodec>;

/// Connect to `addr` and frame the stream, rejecting lines over `max_line_bytes`.
pub async fn dial(addr: &str, max_line_bytes: usize) -> Result<Lines> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(Framed::new(stream, LinesCodec::new_with_max_length(max_line_bytes)))
}

/// Map a line codec failure onto the relay error taxonomy.
pub fn codec_error(e: LinesCodecError) -> RelayError {
    match e {
        LinesCodecError::MaxLineLengthExceeded => {
            RelayError::BadMessage("line exceeds configured maximum".into())
        }
        LinesCodecError::Io(e) => e.into(),
    }
}
