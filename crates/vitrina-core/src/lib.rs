use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::{OffsetDateTime, UtcOffset};

/// A single catalog record as stored in the backing JSON document.
///
/// Records are open maps rather than a closed struct: the list endpoint
/// filters on a caller-chosen field name, updates merge arbitrary partial
/// bodies, and the bulk endpoint may set fields outside the schema. The
/// schema is enforced by [`validate_modelo`] at write time.
pub type Document = Map<String, Value>;

pub const MSG_PATREON: &str =
    "El Patreon es obligatorio y debe ser B3dserk, Wicked o Star_Wars.";
pub const MSG_TIPO_MODELO: &str =
    "El Tipo de modelo es obligatorio y debe ser: Escultura, Busto o Diorama.";
pub const MSG_PELICULA: &str = "El nombre de la película es obligatorio.";
pub const MSG_NOMBRE_MODELO: &str = "El nombre del modelo es obligatorio.";
pub const MSG_MEDIDA: &str =
    "La medida es obligatoria y debe contener 3 dígitos y terminar en mm.";
pub const MSG_ESCALA: &str =
    "La escala del modelo es obligatoria y debe ser 1/6 o 1/4.";
pub const MSG_FALLBACK: &str = "Error en la validación de entrada.";

/// First schema violation found in a candidate record.
///
/// The message is the canned wire string for the failing field; it is what
/// the HTTP layer returns verbatim in the 400 body.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum Patreon {
    Wicked,
    B3dserk,
    #[serde(rename = "Star_Wars")]
    StarWars,
}

impl Patreon {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wicked => "Wicked",
            Self::B3dserk => "B3dserk",
            Self::StarWars => "Star_Wars",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Wicked" => Some(Self::Wicked),
            "B3dserk" => Some(Self::B3dserk),
            "Star_Wars" => Some(Self::StarWars),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum TipoModelo {
    Escultura,
    Busto,
    Diorama,
}

impl TipoModelo {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Escultura => "Escultura",
            Self::Busto => "Busto",
            Self::Diorama => "Diorama",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Escultura" => Some(Self::Escultura),
            "Busto" => Some(Self::Busto),
            "Diorama" => Some(Self::Diorama),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub enum Escala {
    #[serde(rename = "1/6")]
    Sexta,
    #[serde(rename = "1/4")]
    Cuarta,
}

impl Escala {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sexta => "1/6",
            Self::Cuarta => "1/4",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1/6" => Some(Self::Sexta),
            "1/4" => Some(Self::Cuarta),
            _ => None,
        }
    }
}

/// Every key the schema admits; anything else fails with [`MSG_FALLBACK`].
const SCHEMA_FIELDS: [&str; 10] = [
    "id",
    "Patreon",
    "Tipo_Modelo",
    "Pelicula",
    "Nombre_Modelo",
    "Medida",
    "Escala",
    "ipAddress",
    "createdAt",
    "updatedAt",
];

/// Validates a fully assembled record against the fixed schema.
///
/// Fields are checked in declaration order and validation stops at the
/// first violation, so exactly one canned message is reported per attempt.
///
/// # Errors
/// Returns [`ValidationError`] naming the first failing field. The six
/// required domain fields each carry their own message; `id`, malformed
/// optional timestamps, and keys outside the schema all fall back to
/// [`MSG_FALLBACK`].
pub fn validate_modelo(candidate: &Document) -> Result<(), ValidationError> {
    if !candidate
        .get("id")
        .and_then(Value::as_u64)
        .is_some_and(|id| id >= 1)
    {
        return Err(fail("id", MSG_FALLBACK));
    }

    if !string_field(candidate, "Patreon").is_some_and(|v| Patreon::parse(v).is_some()) {
        return Err(fail("Patreon", MSG_PATREON));
    }

    if !string_field(candidate, "Tipo_Modelo").is_some_and(|v| TipoModelo::parse(v).is_some()) {
        return Err(fail("Tipo_Modelo", MSG_TIPO_MODELO));
    }

    if !string_field(candidate, "Pelicula").is_some_and(|v| !v.is_empty()) {
        return Err(fail("Pelicula", MSG_PELICULA));
    }

    if !string_field(candidate, "Nombre_Modelo").is_some_and(|v| !v.is_empty()) {
        return Err(fail("Nombre_Modelo", MSG_NOMBRE_MODELO));
    }

    if !string_field(candidate, "Medida").is_some_and(|v| v.len() >= 3 && v.ends_with("mm")) {
        return Err(fail("Medida", MSG_MEDIDA));
    }

    if !string_field(candidate, "Escala").is_some_and(|v| Escala::parse(v).is_some()) {
        return Err(fail("Escala", MSG_ESCALA));
    }

    if let Some(value) = candidate.get("ipAddress") {
        if !value.is_string() {
            return Err(fail("ipAddress", MSG_FALLBACK));
        }
    }

    for field in ["createdAt", "updatedAt"] {
        if let Some(value) = candidate.get(field) {
            let parses = value.as_str().is_some_and(|raw| parse_rfc3339(raw).is_ok());
            if !parses {
                return Err(fail(field, MSG_FALLBACK));
            }
        }
    }

    for key in candidate.keys() {
        if !SCHEMA_FIELDS.contains(&key.as_str()) {
            return Err(fail(key, MSG_FALLBACK));
        }
    }

    Ok(())
}

fn string_field<'a>(candidate: &'a Document, field: &str) -> Option<&'a str> {
    candidate.get(field).and_then(Value::as_str)
}

fn fail(field: &str, message: &'static str) -> ValidationError {
    ValidationError { field: field.to_string(), message }
}

// Timestamp formats carried over from the original deployment: record
// timestamps are RFC 3339, the access log uses `DD-MM-YYYY HH:mm:ss`, and
// the bulk-update sidecar uses `HH:mm DD-MM-YYYY`.
static ACCESS_LOG_STAMP: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
static SIDECAR_STAMP: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();

fn access_log_format() -> &'static [FormatItem<'static>] {
    ACCESS_LOG_STAMP.get_or_init(|| {
        time::format_description::parse("[day]-[month]-[year] [hour]:[minute]:[second]")
            .unwrap_or_default()
    })
}

fn sidecar_format() -> &'static [FormatItem<'static>] {
    SIDECAR_STAMP.get_or_init(|| {
        time::format_description::parse("[hour]:[minute] [day]-[month]-[year]")
            .unwrap_or_default()
    })
}

#[must_use]
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(UtcOffset::UTC)
}

/// # Errors
/// Returns the underlying parse error when the input is not RFC 3339.
pub fn parse_rfc3339(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339)
}

/// # Errors
/// Returns the underlying format error, which cannot occur for UTC values.
pub fn format_rfc3339(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(&Rfc3339)
}

/// # Errors
/// Returns the underlying format error, which cannot occur for UTC values.
pub fn format_access_stamp(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(access_log_format())
}

/// # Errors
/// Returns the underlying format error, which cannot occur for UTC values.
pub fn format_sidecar_stamp(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(sidecar_format())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn must_ok<T, E: std::fmt::Display>(result: Result<T, E>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("expected Ok(..), got error: {err}"),
        }
    }

    fn fixture_modelo() -> Document {
        let Value::Object(doc) = json!({
            "id": 1,
            "Patreon": "Wicked",
            "Tipo_Modelo": "Busto",
            "Pelicula": "Wicked",
            "Nombre_Modelo": "Elphaba",
            "Medida": "150mm",
            "Escala": "1/6"
        }) else {
            panic!("fixture must be a JSON object");
        };
        doc
    }

    fn expect_message(doc: &Document, field: &str, message: &str) {
        match validate_modelo(doc) {
            Ok(()) => panic!("expected {field} to fail validation"),
            Err(err) => {
                assert_eq!(err.field, field);
                assert_eq!(err.message, message);
            }
        }
    }

    #[test]
    fn valid_record_passes() {
        assert_eq!(validate_modelo(&fixture_modelo()), Ok(()));
    }

    #[test]
    fn optional_stamp_fields_are_accepted() {
        let mut doc = fixture_modelo();
        doc.insert("ipAddress".to_string(), json!("127.0.0.1"));
        doc.insert("createdAt".to_string(), json!("2026-08-07T10:00:00Z"));
        doc.insert("updatedAt".to_string(), json!("2026-08-07T11:30:00Z"));
        assert_eq!(validate_modelo(&doc), Ok(()));
    }

    #[test]
    fn missing_id_reports_fallback_message() {
        let mut doc = fixture_modelo();
        doc.remove("id");
        expect_message(&doc, "id", MSG_FALLBACK);
    }

    #[test]
    fn zero_id_reports_fallback_message() {
        let mut doc = fixture_modelo();
        doc.insert("id".to_string(), json!(0));
        expect_message(&doc, "id", MSG_FALLBACK);
    }

    #[test]
    fn unknown_patreon_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.insert("Patreon".to_string(), json!("Sideshow"));
        expect_message(&doc, "Patreon", MSG_PATREON);
    }

    #[test]
    fn unknown_tipo_modelo_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.insert("Tipo_Modelo".to_string(), json!("Estatua"));
        expect_message(&doc, "Tipo_Modelo", MSG_TIPO_MODELO);
    }

    #[test]
    fn empty_pelicula_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.insert("Pelicula".to_string(), json!(""));
        expect_message(&doc, "Pelicula", MSG_PELICULA);
    }

    #[test]
    fn missing_nombre_modelo_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.remove("Nombre_Modelo");
        expect_message(&doc, "Nombre_Modelo", MSG_NOMBRE_MODELO);
    }

    #[test]
    fn medida_without_mm_suffix_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.insert("Medida".to_string(), json!("150cm"));
        expect_message(&doc, "Medida", MSG_MEDIDA);
    }

    #[test]
    fn medida_shorter_than_three_chars_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.insert("Medida".to_string(), json!("mm"));
        expect_message(&doc, "Medida", MSG_MEDIDA);
    }

    #[test]
    fn escala_outside_fixed_set_reports_canned_message() {
        let mut doc = fixture_modelo();
        doc.insert("Escala".to_string(), json!("1/2"));
        expect_message(&doc, "Escala", MSG_ESCALA);
    }

    #[test]
    fn first_failure_wins_over_later_ones() {
        let mut doc = fixture_modelo();
        doc.insert("Patreon".to_string(), json!("Sideshow"));
        doc.insert("Escala".to_string(), json!("1/2"));
        expect_message(&doc, "Patreon", MSG_PATREON);
    }

    #[test]
    fn key_outside_schema_reports_fallback_message() {
        let mut doc = fixture_modelo();
        doc.insert("updated_at".to_string(), json!("10:30 07-08-2026"));
        expect_message(&doc, "updated_at", MSG_FALLBACK);
    }

    #[test]
    fn malformed_created_at_reports_fallback_message() {
        let mut doc = fixture_modelo();
        doc.insert("createdAt".to_string(), json!("yesterday"));
        expect_message(&doc, "createdAt", MSG_FALLBACK);
    }

    #[test]
    fn enum_parse_round_trips() {
        for patreon in [Patreon::Wicked, Patreon::B3dserk, Patreon::StarWars] {
            assert_eq!(Patreon::parse(patreon.as_str()), Some(patreon));
        }
        for tipo in [TipoModelo::Escultura, TipoModelo::Busto, TipoModelo::Diorama] {
            assert_eq!(TipoModelo::parse(tipo.as_str()), Some(tipo));
        }
        for escala in [Escala::Sexta, Escala::Cuarta] {
            assert_eq!(Escala::parse(escala.as_str()), Some(escala));
        }
        assert_eq!(Patreon::parse("wicked"), None);
    }

    #[test]
    fn rfc3339_round_trip() {
        let parsed = must_ok(parse_rfc3339("2026-08-07T10:00:00Z"));
        assert_eq!(must_ok(format_rfc3339(parsed)), "2026-08-07T10:00:00Z");
    }

    #[test]
    fn access_stamp_uses_day_first_format() {
        let parsed = must_ok(parse_rfc3339("2026-08-07T09:05:01Z"));
        assert_eq!(must_ok(format_access_stamp(parsed)), "07-08-2026 09:05:01");
    }

    #[test]
    fn sidecar_stamp_puts_time_before_date() {
        let parsed = must_ok(parse_rfc3339("2026-08-07T09:05:01Z"));
        assert_eq!(must_ok(format_sidecar_stamp(parsed)), "09:05 07-08-2026");
    }
}
