//! Format synthesizer: leaf strings for well-known `format` values

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{NaiveDate, SecondsFormat, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use apiseed_core::Schema;

use crate::primitive::random_alnum;

/// Produces a string for a schema's `format`, or `None` for unknown formats.
pub trait FormatSynthesizer {
    /// # Errors
    ///
    /// Returns [`FormatError`] when a recognized format cannot be rendered.
    fn generate(&mut self, schema: &Schema, property_path: &str)
    -> Result<Option<String>, FormatError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("cannot render format '{format}' for '{property}': {reason}")]
    Render {
        format: String,
        property: String,
        reason: String,
    },
}

/// Built-in formats, driven by its own RNG.
#[derive(Debug, Clone)]
pub struct DefaultFormats {
    rng: SmallRng,
}

impl Default for DefaultFormats {
    fn default() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }
}

impl DefaultFormats {
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn uuid(&mut self) -> String {
        let rng = &mut self.rng;
        format!(
            "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
            rng.r#gen::<u32>(),
            rng.r#gen::<u16>(),
            rng.r#gen::<u16>() & 0x0FFF,
            (rng.r#gen::<u16>() & 0x3FFF) | 0x8000,
            rng.r#gen::<u64>() & 0xFFFF_FFFF_FFFF,
        )
    }

    fn date(&mut self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.rng.gen_range(2000..=2030),
            self.rng.gen_range(1..=12),
            self.rng.gen_range(1..=28),
        )
    }

    fn date_time(&mut self) -> Option<String> {
        let date = self.date()?;
        let time = date.and_hms_opt(
            self.rng.gen_range(0..24),
            self.rng.gen_range(0..60),
            self.rng.gen_range(0..60),
        )?;
        Some(
            Utc.from_utc_datetime(&time)
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    fn time(&mut self) -> String {
        format!(
            "{:02}:{:02}:{:02}Z",
            self.rng.gen_range(0..24),
            self.rng.gen_range(0..60),
            self.rng.gen_range(0..60)
        )
    }

    fn ipv4(&mut self) -> String {
        let octets: Vec<String> = (0..4)
            .map(|i| {
                let lo = if i == 0 { 1 } else { 0 };
                self.rng.gen_range(lo..=254_u8).to_string()
            })
            .collect();
        octets.join(".")
    }

    fn ipv6(&mut self) -> String {
        let groups: Vec<String> = (0..8)
            .map(|_| format!("{:x}", self.rng.r#gen::<u16>()))
            .collect();
        groups.join(":")
    }
}

impl FormatSynthesizer for DefaultFormats {
    fn generate(
        &mut self,
        schema: &Schema,
        property_path: &str,
    ) -> Result<Option<String>, FormatError> {
        let Some(format) = schema.format.as_deref() else {
            return Ok(None);
        };
        let render_failed = |reason: &str| FormatError::Render {
            format: format.to_string(),
            property: property_path.to_string(),
            reason: reason.to_string(),
        };

        let value = match format {
            "uuid" => self.uuid(),
            "date" => self
                .date()
                .ok_or_else(|| render_failed("invalid calendar date"))?
                .format("%Y-%m-%d")
                .to_string(),
            "date-time" => self
                .date_time()
                .ok_or_else(|| render_failed("invalid timestamp"))?,
            "time" => self.time(),
            "email" => format!("user{}@example.com", self.rng.gen_range(1..9999_u32)),
            "uri" | "url" => format!(
                "https://example.com/{}",
                random_alnum(&mut self.rng, 8).to_lowercase()
            ),
            "hostname" => format!("{}.example.com", random_alnum(&mut self.rng, 8).to_lowercase()),
            "ipv4" => self.ipv4(),
            "ipv6" => self.ipv6(),
            "password" => format!("Aa1!{}", random_alnum(&mut self.rng, 8)),
            "byte" => STANDARD.encode(random_alnum(&mut self.rng, 12)),
            "binary" => random_alnum(&mut self.rng, 12),
            _ => return Ok(None),
        };
        Ok(Some(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(format: &str) -> Schema {
        serde_json::from_value(json!({"type": "string", "format": format})).unwrap()
    }

    fn render(format: &str) -> String {
        DefaultFormats::seeded(42)
            .generate(&schema(format), "field")
            .unwrap()
            .unwrap()
    }

    #[test]
    fn uuid_shape() {
        let id = render("uuid");
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.iter().map(|p| p.len()).collect::<Vec<_>>(), vec![8, 4, 4, 4, 12]);
        assert!(parts[2].starts_with('4'));
    }

    #[test]
    fn dates_parse() {
        assert!(NaiveDate::parse_from_str(&render("date"), "%Y-%m-%d").is_ok());
        let ts = render("date-time");
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok(), "{ts}");
        assert!(ts.ends_with('Z'));
    }

    #[test]
    fn network_formats() {
        assert!(render("email").contains('@'));
        assert!(render("uri").starts_with("https://"));
        assert!(render("ipv4").parse::<std::net::Ipv4Addr>().is_ok());
        assert!(render("ipv6").parse::<std::net::Ipv6Addr>().is_ok());
        assert!(render("hostname").ends_with(".example.com"));
    }

    #[test]
    fn byte_is_base64() {
        let encoded = render("byte");
        assert_eq!(STANDARD.decode(encoded).unwrap().len(), 12);
    }

    #[test]
    fn unknown_format_falls_through() {
        let mut formats = DefaultFormats::seeded(1);
        assert_eq!(formats.generate(&schema("x-custom"), "field").unwrap(), None);
        let untyped = Schema::of_type("string");
        assert_eq!(formats.generate(&untyped, "field").unwrap(), None);
    }
}
