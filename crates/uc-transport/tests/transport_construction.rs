use std::sync::Arc;

use uc_model::Config;
use uc_transport::{HttpTransport, NoAuth};

#[test]
fn transport_builds_with_default_config() {
    let cfg = Config::default();
    let transport = HttpTransport::new(&cfg, Arc::new(NoAuth));
    assert!(transport.is_ok());
}

#[test]
fn transport_builds_with_skip_verify_and_no_proxy() {
    let mut cfg = Config::default();
    cfg.skip_verify = true;
    cfg.disable_keep_alive = true;
    let transport = HttpTransport::new(&cfg, Arc::new(NoAuth));
    assert!(transport.is_ok());
}
