use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::record::{Catalog, SoundRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no sound with id \"{0}\" in the catalog")]
    NotFound(String),
}

/// Exact lookup by id. Unknown ids are an error, never a default record.
pub fn resolve<'a>(catalog: &'a Catalog, id: &str) -> Result<&'a SoundRecord, SelectionError> {
    catalog
        .iter()
        .find(|record| record.id == id)
        .ok_or_else(|| SelectionError::NotFound(id.to_owned()))
}

/// Records whose id, IPA, example, type or description contain `query`,
/// ignoring case and diacritics. Catalog order is kept; an empty query
/// matches everything.
pub fn filter<'a>(catalog: &'a Catalog, query: &str) -> Vec<&'a SoundRecord> {
    let needle = fold(query.trim());
    if needle.is_empty() {
        return catalog.iter().collect();
    }
    catalog
        .iter()
        .filter(|record| {
            [
                &record.id,
                &record.ipa,
                &record.example,
                &record.kind,
                &record.description,
            ]
            .into_iter()
            .any(|field| fold(field).contains(&needle))
        })
        .collect()
}

/// Lowercase and strip combining marks after canonical decomposition,
/// so "Árbol" and "arbol" compare equal.
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: &str, kind: &str, ipa: &str, example: &str, description: &str) -> SoundRecord {
        SoundRecord {
            id: id.to_owned(),
            description: description.to_owned(),
            audio: None,
            icon: None,
            kind: kind.to_owned(),
            ipa: ipa.to_owned(),
            example: example.to_owned(),
        }
    }

    fn sample() -> Catalog {
        Catalog::new(vec![
            record("CC01", "vowel", "/a/", "casa", "Open front vowel"),
            record("CC02", "consonant", "/ɲ/", "niño", "Palatal nasal"),
            record("CC03", "vowel", "/e/", "café", ""),
            record("CC04", "consonant", "/ʎ/", "llave", "Palatal lateral"),
        ])
    }

    fn ids<'a>(records: &[&'a SoundRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn resolve_exact_match() {
        let catalog = sample();
        assert_eq!(resolve(&catalog, "CC03").expect("found").example, "café");
    }

    #[test]
    fn resolve_is_case_sensitive_and_exact() {
        let catalog = sample();
        assert_eq!(
            resolve(&catalog, "cc03"),
            Err(SelectionError::NotFound("cc03".to_owned()))
        );
        assert!(resolve(&catalog, "CC0").is_err());
        assert!(resolve(&catalog, "CC99").is_err());
    }

    #[test]
    fn filter_empty_query_returns_everything() {
        let catalog = sample();
        assert_eq!(ids(&filter(&catalog, "")), vec!["CC01", "CC02", "CC03", "CC04"]);
        assert_eq!(ids(&filter(&catalog, "   ")), vec!["CC01", "CC02", "CC03", "CC04"]);
    }

    #[test]
    fn filter_ignores_case_and_diacritics() {
        let catalog = sample();
        assert_eq!(ids(&filter(&catalog, "NINO")), vec!["CC02"]);
        assert_eq!(ids(&filter(&catalog, "cafe")), vec!["CC03"]);
        assert_eq!(ids(&filter(&catalog, "CAFÉ")), vec!["CC03"]);
    }

    #[test]
    fn filter_searches_every_text_field() {
        let catalog = sample();
        assert_eq!(ids(&filter(&catalog, "palatal")), vec!["CC02", "CC04"]);
        assert_eq!(ids(&filter(&catalog, "vowel")), vec!["CC01", "CC03"]);
        assert_eq!(ids(&filter(&catalog, "/ʎ/")), vec!["CC04"]);
        assert_eq!(ids(&filter(&catalog, "cc0")).len(), 4);
        assert!(filter(&catalog, "zzz").is_empty());
    }

    #[test]
    fn fold_strips_marks() {
        assert_eq!(fold("Árbol Ñandú"), "arbol nandu");
    }

    fn arb_record() -> impl Strategy<Value = SoundRecord> {
        ("[A-Z]{2}[0-9]{2}", "[a-zé]{0,3}", "[a-zñ]{0,6}", "[a-z ]{0,8}").prop_map(
            |(id, ipa, example, description)| record(&id, "", &ipa, &example, &description),
        )
    }

    proptest! {
        #[test]
        fn filter_preserves_catalog_order(
            records in prop::collection::vec(arb_record(), 0..20),
            query in "[a-zé]{0,2}",
        ) {
            let catalog = Catalog::new(records);
            let hits = filter(&catalog, &query);

            // Every hit appears in the catalog after the previous one.
            let mut positions = hits.iter().map(|hit| {
                catalog.iter().position(|r| std::ptr::eq(r, *hit)).expect("hit is from catalog")
            });
            let mut last = None;
            for pos in &mut positions {
                prop_assert!(last.is_none_or(|l| l < pos));
                last = Some(pos);
            }
        }

        #[test]
        fn filter_empty_query_is_identity(records in prop::collection::vec(arb_record(), 0..20)) {
            let catalog = Catalog::new(records);
            let all: Vec<&SoundRecord> = catalog.iter().collect();
            prop_assert_eq!(filter(&catalog, ""), all);
        }
    }
}
