//! Network rules: payload downloads, reverse shells, suspicious endpoints,
//! and weakened transport security.

use super::{extension, RuleDescriptor, RuleHit, BINARY_EXTENSIONS, SCRIPT_EXTENSIONS};
use crate::engine::callsite::{is_constant, CallSite};
use crate::types::{RuleCategory, Severity};
use std::net::Ipv4Addr;

/// TLDs disproportionately used by throwaway malicious infrastructure.
const SUSPICIOUS_TLDS: &[&str] = &[
    ".xyz", ".top", ".pw", ".club", ".tk", ".ga", ".cf", ".gq", ".ml",
];

/// Services commonly used as payload hosts or exfiltration endpoints.
const SUSPICIOUS_SERVICES: &[&str] = &[
    "pastebin.com",
    "hastebin.com",
    "discordapp.com/api/webhooks",
    "discord.com/api/webhooks",
    "ngrok.io",
    "webhook.site",
];

pub(super) const RULES: &[RuleDescriptor] = &[
    RuleDescriptor {
        id: "NET_DOWNLOAD_EXECUTABLE",
        category: RuleCategory::Network,
        brief: "Downloading a file with an executable extension",
        check: download_executable,
    },
    RuleDescriptor {
        id: "NET_DOWNLOAD_PAYLOAD",
        category: RuleCategory::Network,
        brief: "Download-to-disk functions (urlretrieve, wget)",
        check: download_payload,
    },
    RuleDescriptor {
        id: "NET_REVERSE_SHELL_SOCKET",
        category: RuleCategory::Network,
        brief: "Socket creation and PTY shell spawning",
        check: reverse_shell_socket,
    },
    RuleDescriptor {
        id: "NET_REVERSE_SHELL_FD",
        category: RuleCategory::Network,
        brief: "Subprocess wired to a socket file descriptor",
        check: reverse_shell_fd,
    },
    RuleDescriptor {
        id: "NET_SUSPICIOUS_DOMAIN",
        category: RuleCategory::Network,
        brief: "Connections to suspicious TLDs, services, or raw IPs",
        check: suspicious_domain,
    },
    RuleDescriptor {
        id: "NET_SSL_DISABLED",
        category: RuleCategory::Network,
        brief: "Disabled certificate or hostname verification",
        check: ssl_disabled,
    },
    RuleDescriptor {
        id: "NET_HTTP_UNENCRYPTED",
        category: RuleCategory::Network,
        brief: "Unencrypted http:// usage",
        check: http_unencrypted,
    },
    RuleDescriptor {
        id: "NET_DNS_TUNNELING",
        category: RuleCategory::Network,
        brief: "Dynamic hostname lookups (possible DNS tunneling)",
        check: dns_tunneling,
    },
];

fn download_executable(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !matches!(callee, "urllib.request.urlretrieve" | "requests.get") {
        return None;
    }

    let url = site.arg_string(0)?;
    // Drop query parameters before looking at the extension.
    let path = url.split('?').next().unwrap_or(&url);
    let ext = extension(path)?;
    if BINARY_EXTENSIONS.contains(&ext.as_str()) || SCRIPT_EXTENSIONS.contains(&ext.as_str()) {
        return Some(RuleHit::new(
            format!("Downloading executable file detected: {url}"),
            Severity::Critical,
        ));
    }

    None
}

fn download_payload(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if callee == "urllib.request.urlretrieve" || callee == "wget.download" {
        return Some(RuleHit::new(
            format!("File download detected via {callee}. Potential second-stage payload."),
            Severity::Warning,
        ));
    }
    None
}

fn reverse_shell_socket(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;

    if callee == "socket.socket" {
        return Some(RuleHit::new(
            "Socket creation detected. Verify network activity.",
            Severity::Info,
        ));
    }

    if callee == "pty.spawn" {
        let arg = site.arg_string(0)?;
        if arg.contains("/bin/sh") || arg.contains("/bin/bash") {
            return Some(RuleHit::new(
                "PTY spawn of a shell detected. High probability of reverse shell.",
                Severity::Critical,
            ));
        }
    }

    None
}

fn reverse_shell_fd(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !matches!(callee, "subprocess.call" | "subprocess.Popen") {
        return None;
    }

    // stdin=s.fileno() style redirection of standard streams.
    for stream in ["stdin", "stdout", "stderr"] {
        if let Some(value) = site.kwarg(stream) {
            if value.kind() == "call" {
                if let Some(func) = value.child_by_field_name("function") {
                    if func.kind() == "attribute" {
                        if let Some(attr) = func.child_by_field_name("attribute") {
                            if attr.utf8_text(site.source().as_bytes()) == Ok("fileno") {
                                return Some(RuleHit::new(
                                    "Reverse shell pattern detected: subprocess with socket file descriptor.",
                                    Severity::Critical,
                                ));
                            }
                        }
                    }
                }
            }
        }
    }

    None
}

fn suspicious_domain(site: &CallSite) -> Option<RuleHit> {
    for text in site.string_args() {
        if !text.contains("http") {
            continue;
        }
        for part in text.split_whitespace() {
            if !part.starts_with("http://") && !part.starts_with("https://") {
                continue;
            }

            for service in SUSPICIOUS_SERVICES {
                if part.contains(service) {
                    return Some(RuleHit::new(
                        format!("Connection to suspicious service detected: {service}"),
                        Severity::Warning,
                    ));
                }
            }

            let domain = part
                .splitn(4, '/')
                .nth(2)
                .unwrap_or(part)
                .split(':')
                .next()
                .unwrap_or(part);

            for tld in SUSPICIOUS_TLDS {
                if domain.ends_with(tld) {
                    return Some(RuleHit::new(
                        format!("Connection to suspicious TLD detected: {tld}"),
                        Severity::Warning,
                    ));
                }
            }

            if domain.parse::<Ipv4Addr>().is_ok() {
                return Some(RuleHit::new(
                    format!("Connection to raw IP address detected: {domain}"),
                    Severity::Warning,
                ));
            }
        }
    }

    None
}

fn ssl_disabled(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;

    if callee.starts_with("requests.") && site.kwarg_is_false("verify") {
        return Some(RuleHit::new(
            "SSL verification disabled (verify=False). Vulnerable to MITM.",
            Severity::Warning,
        ));
    }

    if callee == "ssl.create_default_context" && site.kwarg_is_false("check_hostname") {
        return Some(RuleHit::new(
            "SSL hostname check disabled.",
            Severity::Warning,
        ));
    }

    if callee == "ssl._create_unverified_context" {
        return Some(RuleHit::new(
            "Unverified SSL context created.",
            Severity::Warning,
        ));
    }

    None
}

fn http_unencrypted(site: &CallSite) -> Option<RuleHit> {
    if site
        .string_args()
        .iter()
        .any(|s| s.contains("http://"))
    {
        return Some(RuleHit::new(
            "Unencrypted HTTP URL detected. Use HTTPS.",
            Severity::Warning,
        ));
    }

    if site.callee() == Some("http.client.HTTPConnection") {
        return Some(RuleHit::new(
            "Unencrypted HTTPConnection usage detected.",
            Severity::Warning,
        ));
    }

    None
}

fn dns_tunneling(site: &CallSite) -> Option<RuleHit> {
    let callee = site.callee()?;
    if !matches!(
        callee,
        "socket.gethostbyname" | "socket.getaddrinfo" | "dns.resolver.query"
    ) {
        return None;
    }

    let arg0 = site.arg(0)?;
    if !is_constant(arg0) {
        // High false-positive rate, so informational only.
        return Some(RuleHit::new(
            format!("Potential DNS tunneling/scanning: dynamic hostname lookup via {callee}."),
            Severity::Info,
        ));
    }

    None
}
