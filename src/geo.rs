use serde::Deserialize;
use std::time::Duration;

/// Resolved location for an analytics event.
#[derive(Debug, Clone)]
pub struct GeoLocation {
    pub country: String,
    pub city: String,
}

impl GeoLocation {
    pub fn unknown() -> Self {
        GeoLocation {
            country: "Unknown".to_string(),
            city: "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    country_name: Option<String>,
    city: Option<String>,
}

/// Addresses that never resolve to a useful location.
fn is_local(ip: &str) -> bool {
    ip.is_empty()
        || ip == "unknown"
        || ip == "127.0.0.1"
        || ip == "::1"
        || ip.starts_with("192.168.")
        || ip.starts_with("10.")
        || ip.starts_with("172.16.")
}

/// Look up country/city for an IP via ipapi.co. The tracking endpoint calls
/// this inline, so the timeout is kept short; any failure degrades to
/// "Unknown" rather than surfacing an error.
pub fn lookup(ip: &str) -> GeoLocation {
    if is_local(ip) {
        return GeoLocation::unknown();
    }

    let client = match reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
    {
        Ok(c) => c,
        Err(_) => return GeoLocation::unknown(),
    };

    let url = format!("https://ipapi.co/{}/json/", ip);
    match client.get(&url).send() {
        Ok(resp) if resp.status().is_success() => match resp.json::<IpApiResponse>() {
            Ok(data) => GeoLocation {
                country: data.country_name.unwrap_or_else(|| "Unknown".to_string()),
                city: data.city.unwrap_or_else(|| "Unknown".to_string()),
            },
            Err(e) => {
                log::warn!("Geo lookup parse error for {}: {}", ip, e);
                GeoLocation::unknown()
            }
        },
        Ok(resp) => {
            log::warn!("Geo lookup for {} returned {}", ip, resp.status());
            GeoLocation::unknown()
        }
        Err(e) => {
            log::warn!("Geo lookup failed for {}: {}", ip, e);
            GeoLocation::unknown()
        }
    }
}
