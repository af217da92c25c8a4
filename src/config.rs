//! Address, port and timeout settings shared by both binaries.
//!
//! Bad values never abort the program here: they fall back to the defaults
//! with a warning, the same way on the client and on the server.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use log::warn;

/// Port used when none (or an invalid one) is given.
pub const DEFAULT_PORT: u16 = 60000;

/// Address used when none (or an invalid one) is given.
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// A resolved setting, with the warning to show when a default replaced a
/// bad value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting<T> {
    /// The value to use.
    pub value: T,
    /// Set when the given value was rejected.
    pub warning: Option<String>,
}

impl<T> Setting<T> {
    fn given(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    fn fallback(value: T, warning: String) -> Self {
        warn!("{warning}");
        Self {
            value,
            warning: Some(warning),
        }
    }
}

/// Resolve the port argument. Anything outside 1-65535 falls back to
/// [`DEFAULT_PORT`].
pub fn resolve_port(arg: Option<&str>) -> Setting<u16> {
    let Some(arg) = arg else {
        return Setting::given(DEFAULT_PORT);
    };
    match arg.trim().parse::<u16>() {
        Ok(port) if port != 0 => Setting::given(port),
        _ => Setting::fallback(
            DEFAULT_PORT,
            format!("Port `{arg}` invalid, using default port {DEFAULT_PORT}"),
        ),
    }
}

/// Resolve the host argument. Only IP literals are accepted; anything else
/// falls back to [`DEFAULT_HOST`].
pub fn resolve_host(arg: Option<&str>) -> Setting<IpAddr> {
    let Some(arg) = arg else {
        return Setting::given(DEFAULT_HOST);
    };
    match arg.trim().parse::<IpAddr>() {
        Ok(addr) => Setting::given(addr),
        Err(_) => Setting::fallback(
            DEFAULT_HOST,
            format!("Address `{arg}` invalid, using default address {DEFAULT_HOST}"),
        ),
    }
}

/// `None` (block forever) for a missing or zero value.
pub fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|&s| s > 0).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_defaults_and_fallbacks() {
        assert_eq!(resolve_port(None), Setting::given(DEFAULT_PORT));
        assert_eq!(resolve_port(Some("4000")).value, 4000);
        assert_eq!(resolve_port(Some("65535")).value, 65535);
        for bad in ["0", "65536", "-1", "http"] {
            let port = resolve_port(Some(bad));
            assert_eq!(port.value, DEFAULT_PORT);
            assert!(port.warning.unwrap().contains(bad));
        }
    }

    #[test]
    fn host_defaults_and_fallbacks() {
        assert_eq!(resolve_host(None), Setting::given(DEFAULT_HOST));
        let host = resolve_host(Some("10.0.0.7"));
        assert_eq!(host.value, "10.0.0.7".parse::<IpAddr>().unwrap());
        assert_eq!(host.warning, None);
        assert_eq!(
            resolve_host(Some("::1")).value,
            "::1".parse::<IpAddr>().unwrap()
        );
        for bad in ["localhost", "300.1.1.1"] {
            let host = resolve_host(Some(bad));
            assert_eq!(host.value, DEFAULT_HOST);
            assert!(host.warning.unwrap().contains("default address"));
        }
    }

    #[test]
    fn zero_timeout_means_none() {
        assert_eq!(timeout_from_secs(None), None);
        assert_eq!(timeout_from_secs(Some(0)), None);
        assert_eq!(timeout_from_secs(Some(5)), Some(Duration::from_secs(5)));
    }
}
