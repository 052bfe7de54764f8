//! Failure classifier tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io;

use roomer_core::{classify, FailureClass, RelayError, Severity};

#[test]
fn link_loss_is_network() {
    for err in [RelayError::Shutdown, RelayError::Eof, RelayError::UnexpectedEof] {
        assert_eq!(classify(&err), FailureClass::Network, "err={err}");
    }
}

#[test]
fn everything_else_is_other() {
    let others = [
        RelayError::Io("connection refused".into()),
        RelayError::Remote("rejected".into()),
        RelayError::Protocol("bad reply".into()),
        RelayError::BadMessage("missing command".into()),
        RelayError::NotAcknowledged,
        RelayError::Config("nick".into()),
        RelayError::Store("down".into()),
        RelayError::Cancelled,
        RelayError::Internal("bug".into()),
    ];
    for err in others {
        assert_eq!(classify(&err), FailureClass::Other, "err={err}");
    }
}

#[test]
fn io_errors_map_onto_link_loss() {
    let eof: RelayError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
    assert_eq!(eof, RelayError::UnexpectedEof);

    let reset: RelayError = io::Error::new(io::ErrorKind::ConnectionReset, "reset").into();
    assert_eq!(classify(&reset), FailureClass::Network);

    let refused: RelayError = io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into();
    assert_eq!(refused.code(), "IO");
    assert_eq!(classify(&refused), FailureClass::Other);
}

#[test]
fn severity_follows_class() {
    assert_eq!(FailureClass::Network.severity(), Severity::Warning);
    assert_eq!(FailureClass::Other.severity(), Severity::Error);
}
