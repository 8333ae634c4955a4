//! Applies `ApisixUpstream` settings to generated upstreams.
//!
//! Validation fails on the first out-of-bounds field, reported by its dotted path in the
//! `ApisixUpstream` spec. Values are never clamped.

use apisix_ingress_controller_core::{
    upstream::{
        ActiveCheck, ActiveHealthy, ActiveUnhealthy, CheckType, HashOn, HealthCheck,
        LoadBalancer, PassiveCheck, PassiveHealthy, PassiveUnhealthy, Scheme,
    },
    FieldError, Node, Timeout, TranslateConfig, Upstream, UpstreamIdentity,
    ACTIVE_HEALTH_CHECK_MIN_INTERVAL, HEALTH_CHECK_MAX_CONSECUTIVE,
};
use apisix_ingress_controller_k8s_api::{
    apisix::{self as api, ApisixUpstreamConfig, ApisixUpstreamSpec},
    K8sDuration,
};

// Counter defaults applied by the data plane when a field is left unset.
const ACTIVE_HEALTHY_SUCCESSES: u32 = 2;
const ACTIVE_UNHEALTHY_HTTP_FAILURES: u32 = 5;
const ACTIVE_UNHEALTHY_TCP_FAILURES: u32 = 2;
const ACTIVE_UNHEALTHY_TIMEOUTS: u32 = 3;
const PASSIVE_HEALTHY_SUCCESSES: u32 = 5;
const PASSIVE_UNHEALTHY_HTTP_FAILURES: u32 = 5;
const PASSIVE_UNHEALTHY_TCP_FAILURES: u32 = 2;
const PASSIVE_UNHEALTHY_TIMEOUTS: u32 = 7;

/// Builds the upstream for one service port.
///
/// Without an override the upstream uses plain HTTP with round-robin balancing. With an override,
/// the port-level settings for `identity.port` apply if present, else the service-level settings.
pub fn translate_upstream(
    config: &TranslateConfig,
    identity: &UpstreamIdentity,
    nodes: Vec<Node>,
    overrides: Option<&ApisixUpstreamSpec>,
) -> Result<Upstream, FieldError> {
    let mut ups = match overrides {
        Some(spec) => translate_upstream_config(config, spec.config_for_port(identity.port))?,
        None => Upstream::default(),
    };
    ups.set_name(identity.name());
    ups.nodes = nodes;
    Ok(ups)
}

/// Validates an `ApisixUpstream` config block and converts it to upstream settings.
///
/// The returned upstream has no name, id or nodes.
pub fn translate_upstream_config(
    config: &TranslateConfig,
    au: &ApisixUpstreamConfig,
) -> Result<Upstream, FieldError> {
    let mut ups = Upstream {
        scheme: scheme(au.scheme.as_deref())?,
        ..Default::default()
    };

    if let Some(lb) = au.load_balancer.as_ref() {
        let (kind, hash_on, key) = load_balancer(lb)?;
        ups.load_balancer = kind;
        ups.hash_on = hash_on;
        ups.key = key;
    }

    if let Some(retries) = au.retries {
        let retries = u32::try_from(retries).map_err(|_| FieldError::invalid("retries"))?;
        ups.retries = Some(retries);
    }

    ups.timeout = Some(timeout(config, au.timeout.as_ref())?);

    if let Some(hc) = au.health_check.as_ref() {
        ups.checks = Some(health_check(hc)?);
    }

    if let Some(d) = au.discovery.as_ref() {
        ups.service_name = Some(d.service_name.clone());
        ups.discovery_type = Some(d.kind.clone());
        ups.discovery_args = d.args.clone();
    }

    Ok(ups)
}

fn scheme(scheme: Option<&str>) -> Result<Scheme, FieldError> {
    match scheme {
        None | Some("") => Ok(Scheme::Http),
        Some(s) => s.parse().map_err(|_| FieldError::invalid("scheme")),
    }
}

fn load_balancer(
    lb: &api::LoadBalancer,
) -> Result<(LoadBalancer, Option<HashOn>, Option<String>), FieldError> {
    let kind = match lb.kind.as_str() {
        "" => LoadBalancer::RoundRobin,
        s => s
            .parse()
            .map_err(|_| FieldError::invalid("loadbalancer.type"))?,
    };
    if kind != LoadBalancer::ConsistentHash {
        return Ok((kind, None, None));
    }

    let hash_on = lb
        .hash_on
        .as_deref()
        .ok_or_else(|| FieldError::invalid("loadbalancer.hashOn"))?
        .parse::<HashOn>()
        .map_err(|_| FieldError::invalid("loadbalancer.hashOn"))?;
    let key = lb
        .key
        .clone()
        .filter(|k| !k.is_empty())
        .ok_or_else(|| FieldError::invalid("loadbalancer.key"))?;
    Ok((kind, Some(hash_on), Some(key)))
}

fn timeout(
    config: &TranslateConfig,
    timeout: Option<&api::UpstreamTimeout>,
) -> Result<Timeout, FieldError> {
    let default = config.default_upstream_timeout_secs;
    let secs = |d: Option<&K8sDuration>, field: &str| match d {
        None => Ok(default),
        Some(d) if d.is_negative() => Err(FieldError::invalid(field)),
        Some(d) => Ok(d.as_secs()),
    };
    let Some(t) = timeout else {
        return Ok(Timeout {
            connect: default,
            send: default,
            read: default,
        });
    };
    Ok(Timeout {
        connect: secs(t.connect.as_ref(), "timeout.connect")?,
        send: secs(t.send.as_ref(), "timeout.send")?,
        read: secs(t.read.as_ref(), "timeout.read")?,
    })
}

fn health_check(hc: &api::HealthCheck) -> Result<HealthCheck, FieldError> {
    Ok(HealthCheck {
        active: hc.active.as_ref().map(active_check).transpose()?,
        passive: hc.passive.as_ref().map(passive_check).transpose()?,
    })
}

fn active_check(active: &api::ActiveHealthCheck) -> Result<ActiveCheck, FieldError> {
    let kind = check_type(active.kind.as_deref(), "healthCheck.active.Type")?;

    let port = active
        .port
        .map(|p| {
            u16::try_from(p)
                .ok()
                .filter(|p| *p != 0)
                .ok_or_else(|| FieldError::invalid("healthCheck.active.port"))
        })
        .transpose()?;

    let concurrency = active
        .concurrency
        .map(|c| u32::try_from(c).map_err(|_| FieldError::invalid("healthCheck.active.concurrency")))
        .transpose()?;

    let timeout = active
        .timeout
        .map(|t| {
            if t.is_negative() {
                return Err(FieldError::invalid("healthCheck.active.timeout"));
            }
            Ok(t.as_secs())
        })
        .transpose()?;

    let healthy = active
        .healthy
        .as_ref()
        .map(|h| -> Result<_, FieldError> {
            let successes = counter(
                h.successes,
                ACTIVE_HEALTHY_SUCCESSES,
                "healthCheck.active.healthy.successes",
            )?;
            let http_statuses =
                http_codes(h.http_codes.as_ref(), "healthCheck.active.healthy.httpCodes")?;
            let interval = interval(h.interval, "healthCheck.active.healthy.interval")?;
            Ok(ActiveHealthy {
                interval,
                http_statuses,
                successes,
            })
        })
        .transpose()?;

    let unhealthy = active
        .unhealthy
        .as_ref()
        .map(|u| -> Result<_, FieldError> {
            let http_failures = counter(
                u.http_failures,
                ACTIVE_UNHEALTHY_HTTP_FAILURES,
                "healthCheck.active.unhealthy.httpFailures",
            )?;
            let tcp_failures = counter(
                u.tcp_failures,
                ACTIVE_UNHEALTHY_TCP_FAILURES,
                "healthCheck.active.unhealthy.tcpFailures",
            )?;
            let timeouts = counter(
                u.timeouts,
                ACTIVE_UNHEALTHY_TIMEOUTS,
                "healthCheck.active.unhealthy.timeouts",
            )?;
            let http_statuses = http_codes(
                u.http_codes.as_ref(),
                "healthCheck.active.unhealthy.httpCodes",
            )?;
            let interval = interval(u.interval, "healthCheck.active.unhealthy.interval")?;
            Ok(ActiveUnhealthy {
                interval,
                http_statuses,
                http_failures,
                tcp_failures,
                timeouts,
            })
        })
        .transpose()?;

    Ok(ActiveCheck {
        kind,
        timeout,
        concurrency,
        host: active.host.clone(),
        port,
        http_path: active.http_path.clone(),
        https_verify_certificate: active.strict_tls.unwrap_or(true),
        req_headers: active.request_headers.clone(),
        healthy,
        unhealthy,
    })
}

fn passive_check(passive: &api::PassiveHealthCheck) -> Result<PassiveCheck, FieldError> {
    let kind = check_type(passive.kind.as_deref(), "healthCheck.passive.Type")?;

    let healthy = passive
        .healthy
        .as_ref()
        .map(|h| -> Result<_, FieldError> {
            let successes = counter(
                h.successes,
                PASSIVE_HEALTHY_SUCCESSES,
                "healthCheck.passive.healthy.successes",
            )?;
            let http_statuses =
                http_codes(h.http_codes.as_ref(), "healthCheck.passive.healthy.httpCodes")?;
            Ok(PassiveHealthy {
                http_statuses,
                successes,
            })
        })
        .transpose()?;

    let unhealthy = passive
        .unhealthy
        .as_ref()
        .map(|u| -> Result<_, FieldError> {
            let http_failures = counter(
                u.http_failures,
                PASSIVE_UNHEALTHY_HTTP_FAILURES,
                "healthCheck.passive.unhealthy.httpFailures",
            )?;
            let tcp_failures = counter(
                u.tcp_failures,
                PASSIVE_UNHEALTHY_TCP_FAILURES,
                "healthCheck.passive.unhealthy.tcpFailures",
            )?;
            let timeouts = counter(
                u.timeouts,
                PASSIVE_UNHEALTHY_TIMEOUTS,
                "healthCheck.passive.unhealthy.timeouts",
            )?;
            let http_statuses = http_codes(
                u.http_codes.as_ref(),
                "healthCheck.passive.unhealthy.httpCodes",
            )?;
            Ok(PassiveUnhealthy {
                http_statuses,
                http_failures,
                tcp_failures,
                timeouts,
            })
        })
        .transpose()?;

    Ok(PassiveCheck {
        kind,
        healthy,
        unhealthy,
    })
}

fn check_type(kind: Option<&str>, field: &str) -> Result<CheckType, FieldError> {
    match kind {
        None | Some("") => Ok(CheckType::Http),
        Some(s) => s.parse().map_err(|_| FieldError::invalid(field)),
    }
}

/// Success and failure counters must lie within `[0, 254]`.
fn counter(value: Option<i32>, default: u32, field: &str) -> Result<u32, FieldError> {
    match value {
        None => Ok(default),
        Some(v) if (0..=HEALTH_CHECK_MAX_CONSECUTIVE).contains(&v) => Ok(v as u32),
        Some(_) => Err(FieldError::invalid(field)),
    }
}

/// A code list may be omitted, but not given empty.
fn http_codes(codes: Option<&Vec<i32>>, field: &str) -> Result<Vec<i32>, FieldError> {
    match codes {
        Some(codes) if codes.is_empty() => Err(FieldError::empty(field)),
        Some(codes) => Ok(codes.clone()),
        None => Ok(vec![]),
    }
}

/// Active probe intervals must be at least one second; a missing interval is rejected.
fn interval(interval: Option<K8sDuration>, field: &str) -> Result<u64, FieldError> {
    match interval {
        Some(i) if !i.is_negative() && i.as_duration() >= ACTIVE_HEALTH_CHECK_MIN_INTERVAL => {
            Ok(i.as_secs())
        }
        _ => Err(FieldError::invalid(field)),
    }
}
