//! Empty library target. The crate exists to host the cross-crate
//! integration tests under `tests/`.
