//! TLS provider selection.

/// Installs aws-lc-rs as the process-wide rustls provider.
///
/// octocrab and reqwest each enable a rustls backend; with more than one
/// compiled in, rustls refuses to pick one implicitly. Later calls are
/// no-ops.
pub(crate) fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}
