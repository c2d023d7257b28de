//! Core services that always run ahead of the project's own services

use super::service::ServiceSpec;

fn service(name: &str, hostname: Option<&str>, image: &str, ports: &[&str], volumes: &[&str]) -> ServiceSpec {
    ServiceSpec {
        name: name.to_string(),
        hostname: hostname.map(str::to_string),
        image: image.to_string(),
        ports: ports.iter().filter_map(|p| p.parse().ok()).collect(),
        volumes: volumes.iter().filter_map(|v| v.parse().ok()).collect(),
        ..Default::default()
    }
}

pub fn router_service() -> ServiceSpec {
    service(
        "router",
        Some("box-router"),
        "box-router",
        &["80:80", "443:443"],
        &["@/letsencrypt:/etc/letsencrypt", "@/www/acme:/var/www/acme"],
    )
}

pub fn registry_service() -> ServiceSpec {
    service(
        "registry",
        Some("box-registry"),
        "box-registry",
        &["5000:5000"],
        &["@/registry:/var/lib/registry"],
    )
}

pub fn cron_service() -> ServiceSpec {
    service(
        "cron",
        None,
        "box-cron",
        &[],
        &[
            "@/letsencrypt:/etc/letsencrypt",
            "@/www/acme:/var/www/acme",
            "/var/run/docker.sock:/var/run/docker.sock",
        ],
    )
}

/// Names taken by core services in either mode
pub const CORE_SERVICE_NAMES: [&str; 3] = ["router", "registry", "cron"];

pub fn is_core_service(name: &str) -> bool {
    CORE_SERVICE_NAMES.contains(&name)
}

/// Router only in development; router, registry and cron in production.
pub fn core_services(production: bool) -> Vec<ServiceSpec> {
    if production {
        vec![router_service(), registry_service(), cron_service()]
    } else {
        vec![router_service()]
    }
}
