//! Read-only host facts, queried on demand.
//!
//! Nothing here feeds a convergence decision except `local_address`, which
//! supplies the address for the hosts entry. The snapshot only backs the
//! operator summary printed after a run.

use std::ffi::CStr;
use std::net::{IpAddr, ToSocketAddrs, UdpSocket};

use serde::Serialize;
use tracing::info;

use crate::infrastructure::runner::CommandRunner;

/// Address used for the hosts entry when the local address cannot be found.
pub const FALLBACK_ADDRESS: &str = "127.0.1.1";

/// Identity facts as the host currently reports them. Empty means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    pub hostname: String,
    pub network_node: String,
    pub aliases: String,
    pub short_name: String,
    pub domain_name: String,
    pub fqdn: String,
    pub addresses: String,
}

pub trait HostFacts {
    fn snapshot(&self) -> HostSnapshot;
    /// Primary local address, if one can be determined.
    fn local_address(&self) -> Option<String>;
}

/// Facts from the kernel, the `hostname` tool and the resolver.
pub struct SystemFacts<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> SystemFacts<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        SystemFacts { runner }
    }

    fn hostname_flag(&self, flag: &str) -> String {
        self.runner
            .run("hostname", &[flag])
            .map(|out| out.trim().to_string())
            .unwrap_or_default()
    }
}

impl HostFacts for SystemFacts<'_> {
    fn snapshot(&self) -> HostSnapshot {
        let hostname = kernel_hostname().unwrap_or_default();
        let fqdn = self.hostname_flag("-f");
        HostSnapshot {
            short_name: hostname.split('.').next().unwrap_or("").to_string(),
            network_node: node_name().unwrap_or_default(),
            aliases: self.hostname_flag("-a"),
            domain_name: self.hostname_flag("-d"),
            addresses: resolve_addresses(if fqdn.is_empty() { &hostname } else { &fqdn }),
            fqdn,
            hostname,
        }
    }

    fn local_address(&self) -> Option<String> {
        // connect() on UDP only selects a route; nothing is sent.
        let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
        socket.connect("192.0.2.1:9").ok()?;
        let ip = socket.local_addr().ok()?.ip();
        (!ip.is_unspecified()).then(|| ip.to_string())
    }
}

fn kernel_hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

fn node_name() -> Option<String> {
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    let node = unsafe { CStr::from_ptr(uts.nodename.as_ptr()) };
    Some(node.to_string_lossy().into_owned())
}

fn resolve_addresses(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let mut ips: Vec<IpAddr> = Vec::new();
    if let Ok(addrs) = (name, 0).to_socket_addrs() {
        for addr in addrs {
            if !ips.contains(&addr.ip()) {
                ips.push(addr.ip());
            }
        }
    }
    ips.iter().map(IpAddr::to_string).collect::<Vec<_>>().join(" ")
}

fn or_none(value: &str) -> &str {
    if value.is_empty() {
        "<none>"
    } else {
        value
    }
}

/// Operator-facing summary of the host's identity after a run.
pub fn summary_lines(current: &HostSnapshot, previous_fqdn: &str) -> Vec<String> {
    vec![
        "== New host/node information ==".to_string(),
        format!("Hostname: {}", or_none(&current.hostname)),
        format!("Network node hostname: {}", or_none(&current.network_node)),
        format!("Host aliases: {}", or_none(&current.aliases)),
        format!("Short host name: {}", or_none(&current.short_name)),
        format!("Domain: {}", or_none(&current.domain_name)),
        format!("FQDN: {}", or_none(&current.fqdn)),
        format!("IP addresses: {}", or_none(&current.addresses)),
        format!("FQDN before this run: {}", or_none(previous_fqdn)),
    ]
}

pub fn log_summary(current: &HostSnapshot, previous_fqdn: &str) {
    for line in summary_lines(current, previous_fqdn) {
        info!("{}", line);
    }
}
