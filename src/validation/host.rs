//! Host syntax checks: IPv4 / IPv6 literals and DNS names

use std::net::{Ipv4Addr, Ipv6Addr};

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Syntactic kind of an endpoint host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Ipv4,
    Ipv6,
    DomainName,
}

/// Classify `host`, or `None` when it is neither an address literal nor a domain name.
pub fn classify_host(host: &str) -> Option<HostKind> {
    if host.parse::<Ipv4Addr>().is_ok() {
        Some(HostKind::Ipv4)
    } else if is_ipv6_literal(host) {
        Some(HostKind::Ipv6)
    } else if is_domain_name(host) {
        Some(HostKind::DomainName)
    } else {
        None
    }
}

/// IPv6 literal with an optional `%zone` suffix (e.g. `fe80::1%lo0`)
fn is_ipv6_literal(host: &str) -> bool {
    let addr = match host.split_once('%') {
        Some((addr, zone)) => {
            let zone_ok = !zone.is_empty()
                && zone
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if !zone_ok {
                return false;
            }
            addr
        }
        None => host,
    };

    addr.parse::<Ipv6Addr>().is_ok()
}

fn is_domain_name(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_DOMAIN_LEN {
        return false;
    }

    let mut all_numeric = true;
    for label in host.split('.') {
        if !is_label(label) {
            return false;
        }
        all_numeric &= label.bytes().all(|b| b.is_ascii_digit());
    }

    // "999.1.1.1" is a broken IPv4 address, not a name
    !all_numeric
}

fn is_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
