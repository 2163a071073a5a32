//! squid.conf rendering.

use std::fmt::Write;

use serde_json::Number;

use crate::types::{RefreshPattern, RenderContext};

/// Access control and cache directory boilerplate, identical in every render.
pub const SQUID_PREAMBLE: &str = "
acl localnet src 0.0.0.1-0.255.255.255\t# RFC 1122 \"this\" network (LAN)
acl localnet src 10.0.0.0/8\t\t# RFC 1918 local private network (LAN)
acl localnet src 100.64.0.0/10\t\t# RFC 6598 shared address space (CGN)
acl localnet src 169.254.0.0/16 \t# RFC 3927 link-local (directly plugged) machines
acl localnet src 172.16.0.0/12\t\t# RFC 1918 local private network (LAN)
acl localnet src 192.168.0.0/16\t\t# RFC 1918 local private network (LAN)
acl localnet src fc00::/7       \t# RFC 4193 local private network range
acl localnet src fe80::/10      \t# RFC 4291 link-local (directly plugged) machines
acl SSL_ports port 443
acl Safe_ports port 80\t\t# http
acl Safe_ports port 21\t\t# ftp
acl Safe_ports port 443\t\t# https
acl Safe_ports port 70\t\t# gopher
acl Safe_ports port 210\t\t# wais
acl Safe_ports port 1025-65535\t# unregistered ports
acl Safe_ports port 280\t\t# http-mgmt
acl Safe_ports port 488\t\t# gss-http
acl Safe_ports port 591\t\t# filemaker
acl Safe_ports port 777\t\t# multiling http
acl CONNECT method CONNECT
http_access deny !Safe_ports
http_access deny CONNECT !SSL_ports
http_access allow localhost manager
http_access deny manager
include /etc/squid/conf.d/*
http_access allow localhost
http_access allow localnet
http_access deny all
coredump_dir /var/spool/squid
";

/// Fallback rule, always emitted after the explicit patterns.
pub const CATCH_ALL_REFRESH_PATTERN: &str = "refresh_pattern . 0 20% 4320";

/// Whole numbers print without a fraction, whatever JSON type they came in.
fn number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 => format!("{}", f),
        _ => n.to_string(),
    }
}

fn write_refresh_pattern(out: &mut String, pattern: &RefreshPattern) {
    // `-i` is emitted for patterns flagged case_sensitive. Existing cache
    // clients depend on this mapping.
    let flag = if pattern.case_sensitive { "-i " } else { "" };
    let _ = writeln!(
        out,
        "refresh_pattern {}{} {} {}% {} {}",
        flag,
        pattern.regex,
        number(&pattern.min),
        number(&pattern.percent),
        number(&pattern.max),
        pattern.options.join(" ")
    );
}

/// Render the full squid.conf for `ctx`.
///
/// The output depends only on `ctx`, so equal contexts produce identical
/// bytes.
pub fn render(ctx: &RenderContext) -> String {
    let mut out = String::from(SQUID_PREAMBLE);

    if let Some(log_format) = &ctx.log_format {
        let _ = writeln!(out, "logformat combined {}", log_format);
    }
    for pattern in &ctx.refresh_patterns {
        write_refresh_pattern(&mut out, pattern);
    }
    out.push_str(CATCH_ALL_REFRESH_PATTERN);
    out.push('\n');

    if let Some(port) = ctx.port {
        let _ = writeln!(out, "\nhttp_port {} accel", port);
        for peer in &ctx.peers {
            let _ = writeln!(
                out,
                "cache_peer {} parent {} 0 no-query originserver",
                peer, port
            );
        }
    }
    out.push('\n');
    out
}
