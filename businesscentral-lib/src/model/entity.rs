//! Entity trait and entity set naming

use serde::de::DeserializeOwned;

/// A typed record exposed by the service as an entity set.
///
/// Record definitions are produced outside this crate (typically generated
/// from the service metadata). The only thing the query layer needs is the
/// type name, from which the entity set name is derived.
///
/// # Example
///
/// ```
/// use businesscentral_lib::model::Entity;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Customer {
///     number: String,
/// }
///
/// impl Entity for Customer {
///     const NAME: &'static str = "Customer";
/// }
///
/// assert_eq!(Customer::entity_set_name(), "customers");
/// ```
pub trait Entity: DeserializeOwned + Send + 'static {
    /// The singular type name (e.g., "Customer", "SalesOrder").
    const NAME: &'static str;

    /// Returns the entity set name used in request paths.
    ///
    /// Defaults to the plural of [`Entity::NAME`], lower-cased.
    fn entity_set_name() -> String {
        pluralize_entity_name(Self::NAME).to_lowercase()
    }
}

/// Converts a singular type name to its plural form using English rules.
pub fn pluralize_entity_name(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }

    let lower = name.to_lowercase();

    if lower.ends_with('z') && !lower.ends_with("tz") {
        return format!("{}zes", name);
    }
    if lower.ends_with('s') || lower.ends_with("sh") || lower.ends_with("ch") || lower.ends_with('x') {
        return format!("{}es", name);
    }

    if let Some(stem) = name.strip_suffix(['y', 'Y'])
        && stem.chars().last().is_some_and(|c| !is_vowel(c))
    {
        return format!("{}ies", stem);
    }

    format!("{}s", name)
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_plurals() {
        assert_eq!(pluralize_entity_name("Customer"), "Customers");
        assert_eq!(pluralize_entity_name("item"), "items");
        assert_eq!(pluralize_entity_name("SalesOrder"), "SalesOrders");
    }

    #[test]
    fn test_sibilant_endings() {
        assert_eq!(pluralize_entity_name("address"), "addresses");
        assert_eq!(pluralize_entity_name("Batch"), "Batches");
        assert_eq!(pluralize_entity_name("TaxBox"), "TaxBoxes");
    }

    #[test]
    fn test_consonant_y_endings() {
        assert_eq!(pluralize_entity_name("Company"), "Companies");
        assert_eq!(pluralize_entity_name("currency"), "currencies");
    }

    #[test]
    fn test_vowel_y_endings() {
        assert_eq!(pluralize_entity_name("Journey"), "Journeys");
    }

    #[test]
    fn test_entity_set_name_is_lowercase() {
        #[derive(serde::Deserialize)]
        struct SalesInvoice {}

        impl Entity for SalesInvoice {
            const NAME: &'static str = "SalesInvoice";
        }

        assert_eq!(SalesInvoice::entity_set_name(), "salesinvoices");
    }
}
