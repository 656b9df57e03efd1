//! Fingerprint schemas
//!
//! A schema fixes which fields feed an entity's fingerprint and in what
//! order. The catalog computes the same digest over the stored fields, so
//! changing an order here changes every fingerprint of that kind; bump the
//! schema version when doing so.

use scribe_types::{EntityKind, Fingerprint, fingerprint};

use crate::gateway::{ProviderFields, ScriptFields, ScriptGroupFields};

/// One named field contributing to a fingerprint
pub struct FieldExtractor<T: 'static> {
    pub name: &'static str,
    extract: fn(&T) -> Option<String>,
}

/// Versioned, ordered list of fingerprint fields for one entity kind
pub struct FingerprintSchema<T: 'static> {
    pub kind: EntityKind,
    pub version: u32,
    fields: &'static [FieldExtractor<T>],
}

impl<T> FingerprintSchema<T> {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }

    /// Rendered field values in schema order, `None` for absent values
    pub fn values(&self, node: &T) -> Vec<Option<String>> {
        self.fields.iter().map(|f| (f.extract)(node)).collect()
    }

    pub fn compute(&self, node: &T) -> Fingerprint {
        fingerprint(&self.values(node))
    }
}

const fn field<T>(
    name: &'static str,
    extract: fn(&T) -> Option<String>,
) -> FieldExtractor<T> {
    FieldExtractor { name, extract }
}

fn flag(value: bool) -> Option<String> {
    Some(value.to_string())
}

pub static PROVIDER_SCHEMA: FingerprintSchema<ProviderFields> = FingerprintSchema {
    kind: EntityKind::Provider,
    version: 1,
    fields: &[
        field("alt_id", |p| Some(p.alt_id.to_string())),
        field("name", |p| Some(p.name.clone())),
        field("description", |p| Some(p.description.clone())),
        field("category", |p| p.category.clone()),
        field("logo_url", |p| p.logo_url.clone()),
        field("banner_url", |p| p.banner_url.clone()),
        field("url", |p| p.url.clone()),
        field("color", |p| p.color.clone()),
        field("public", |p| flag(p.public)),
        field("account_service", |p| flag(p.account_service)),
    ],
};

pub static SCRIPT_GROUP_SCHEMA: FingerprintSchema<ScriptGroupFields> = FingerprintSchema {
    kind: EntityKind::ScriptGroup,
    version: 1,
    fields: &[
        field("alt_id", |g| Some(g.alt_id.to_string())),
        field("name", |g| Some(g.name.clone())),
        field("description", |g| Some(g.description.clone())),
        field("public", |g| flag(g.public)),
    ],
};

pub static SCRIPT_SCHEMA: FingerprintSchema<ScriptFields> = FingerprintSchema {
    kind: EntityKind::Script,
    version: 1,
    fields: &[
        field("alt_id", |s| Some(s.alt_id.to_string())),
        field("name", |s| Some(s.name.clone())),
        field("description", |s| Some(s.description.clone())),
        field("price_in_cents", |s| Some(s.price_in_cents.cents_value().to_string())),
        field("recurrence", |s| Some(s.recurrence.as_str().to_string())),
        field("token_lifetime_sec", |s| Some(s.token_lifetime_sec.to_string())),
        field("sla_sec", |s| Some(s.sla_sec.to_string())),
        field("public", |s| flag(s.public)),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scribe_types::{Count, Identity, MoneyValue, Recurrence};

    fn script() -> ScriptFields {
        ScriptFields {
            alt_id: Identity::parse("daily_digest").unwrap(),
            name: "Daily digest".into(),
            description: "One summary a day".into(),
            recurrence: Recurrence::Monthly,
            price_in_cents: MoneyValue::from_cents(499),
            sla_sec: Count::new(3600),
            token_lifetime_sec: Count::new(86400),
            public: true,
        }
    }

    #[test]
    fn test_script_field_order() {
        assert_eq!(
            SCRIPT_SCHEMA.field_names(),
            vec![
                "alt_id",
                "name",
                "description",
                "price_in_cents",
                "recurrence",
                "token_lifetime_sec",
                "sla_sec",
                "public",
            ]
        );
    }

    #[test]
    fn test_script_values_rendering() {
        let values: Vec<String> = SCRIPT_SCHEMA.values(&script()).into_iter().flatten().collect();
        assert_eq!(
            values.join(","),
            "daily_digest,Daily digest,One summary a day,499,monthly,86400,3600,true"
        );
        assert_eq!(
            SCRIPT_SCHEMA.compute(&script()),
            fingerprint(&[Some(values.join(","))])
        );
    }

    #[test]
    fn test_provider_absent_optionals_are_skipped() {
        let fields = ProviderFields {
            alt_id: Identity::parse("acme").unwrap(),
            name: "Acme".into(),
            description: "Acme scripts".into(),
            category: None,
            logo_url: None,
            banner_url: None,
            url: None,
            color: None,
            public: false,
            account_service: false,
        };
        assert_eq!(PROVIDER_SCHEMA.field_names().len(), 10);
        assert_eq!(
            PROVIDER_SCHEMA.compute(&fields),
            fingerprint(&[Some("acme,Acme,Acme scripts,false,false")])
        );
    }

    #[test]
    fn test_any_field_change_changes_fingerprint() {
        let base = SCRIPT_SCHEMA.compute(&script());

        let mut changed = script();
        changed.price_in_cents = MoneyValue::from_cents(500);
        assert_ne!(SCRIPT_SCHEMA.compute(&changed), base);

        let mut changed = script();
        changed.public = false;
        assert_ne!(SCRIPT_SCHEMA.compute(&changed), base);
    }

    #[test]
    fn test_schema_kinds() {
        assert_eq!(PROVIDER_SCHEMA.kind, EntityKind::Provider);
        assert_eq!(SCRIPT_GROUP_SCHEMA.kind, EntityKind::ScriptGroup);
        assert_eq!(SCRIPT_SCHEMA.kind, EntityKind::Script);
        assert_eq!(SCRIPT_GROUP_SCHEMA.version, 1);
    }
}
