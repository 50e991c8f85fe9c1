//! SSRF-safe URL filter (C1 precondition): rejects requests before any
//! network use when the target could reach an internal service.

use std::net::IpAddr;

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsafeReason {
    BadScheme,
    Loopback,
    LinkLocal,
    PrivateRange,
    LocalhostLiteral,
    Unparseable,
}

/// Returns `Ok(())` when `raw_url` is safe to fetch, or the reason it was
/// rejected. Only `http`/`https` schemes pass; loopback, link-local,
/// RFC 1918 private ranges, and the literal host `localhost` are rejected
/// whether given as a hostname or a dotted-quad/IPv6 literal.
pub fn check_url_safety(raw_url: &str) -> Result<(), UnsafeReason> {
    let url = Url::parse(raw_url).map_err(|_| UnsafeReason::Unparseable)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UnsafeReason::BadScheme);
    }

    let host = url.host_str().ok_or(UnsafeReason::Unparseable)?;

    if host.eq_ignore_ascii_case("localhost") {
        return Err(UnsafeReason::LocalhostLiteral);
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return check_ip_safety(ip);
    }

    Ok(())
}

fn check_ip_safety(ip: IpAddr) -> Result<(), UnsafeReason> {
    match ip {
        IpAddr::V4(v4) => {
            if v4.is_loopback() {
                Err(UnsafeReason::Loopback)
            } else if v4.is_link_local() {
                Err(UnsafeReason::LinkLocal)
            } else if v4.is_private() {
                Err(UnsafeReason::PrivateRange)
            } else {
                Ok(())
            }
        }
        IpAddr::V6(v6) => {
            if v6.is_loopback() {
                Err(UnsafeReason::Loopback)
            } else if v6.is_unicast_link_local() {
                Err(UnsafeReason::LinkLocal)
            } else {
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_loopback() {
        assert_eq!(check_url_safety("http://127.0.0.1/x"), Err(UnsafeReason::Loopback));
    }

    #[test]
    fn rejects_private_ranges() {
        assert_eq!(check_url_safety("http://192.168.1.5/x"), Err(UnsafeReason::PrivateRange));
        assert_eq!(check_url_safety("http://10.0.0.1/x"), Err(UnsafeReason::PrivateRange));
        assert_eq!(check_url_safety("http://172.16.0.1/x"), Err(UnsafeReason::PrivateRange));
    }

    #[test]
    fn rejects_localhost_literal() {
        assert_eq!(
            check_url_safety("http://localhost/x"),
            Err(UnsafeReason::LocalhostLiteral)
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert_eq!(check_url_safety("file:///etc/passwd"), Err(UnsafeReason::BadScheme));
        assert_eq!(
            check_url_safety("javascript:alert(1)"),
            Err(UnsafeReason::BadScheme)
        );
    }

    #[test]
    fn allows_public_https() {
        assert!(check_url_safety("https://techcrunch.com/feed").is_ok());
    }
}
