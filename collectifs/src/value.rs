//! Nettoyage des valeurs scalaires issues du recensement
//!
//! Les valeurs sont saisies à la main puis passées par plusieurs exports
//! successifs : on y trouve des `NaN` littéraux, des nombres rendus en
//! `"1234.0"`, des espaces parasites. Tout est ramené à une chaîne propre,
//! avec `-` comme sentinelle d'absence.

use serde_json::Value;

/// Sentinelle utilisée pour les champs absents dans les listes alignées
pub const PLACEHOLDER: &str = "-";

/// Convertit une valeur JSON en chaîne, ou `None` si elle est nulle
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Objets/tableaux imbriqués: rendus tels quels, le nettoyage aval
        // les écartera s'ils ne ressemblent à rien
        other => Some(other.to_string()),
    }
}

/// Nettoie une valeur scalaire: `null`/absent -> `-`, `NaN` -> `-`,
/// suffixe `.0` supprimé (artefact de colonnes numériques), trim.
pub fn clean_value(value: Option<&Value>) -> String {
    let Some(value) = value else {
        return PLACEHOLDER.to_string();
    };
    let Some(s) = value_to_string(value) else {
        return PLACEHOLDER.to_string();
    };
    clean_str(&s)
}

/// Variante de [`clean_value`] sur une chaîne déjà extraite
pub fn clean_str(s: &str) -> String {
    if s == "NaN" || s == "nan" {
        return PLACEHOLDER.to_string();
    }
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.trim().to_string()
}

/// Une ligne (prenom, nom) est abandonnée quand les deux sont absents
pub fn ligne_vide(prenom: &str, nom: &str) -> bool {
    prenom == PLACEHOLDER && nom == PLACEHOLDER
}

/// Découpe un champ agrégé en lignes, en supprimant les vides et les `-`
pub fn split_lines(value: &str) -> Vec<String> {
    value
        .split('\n')
        .map(|s| s.trim_end_matches('\r').trim())
        .filter(|s| !s.is_empty() && *s != PLACEHOLDER)
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clean_value_null() {
        assert_eq!(clean_value(None), "-");
        assert_eq!(clean_value(Some(&Value::Null)), "-");
    }

    #[test]
    fn test_clean_value_nan() {
        assert_eq!(clean_value(Some(&json!("NaN"))), "-");
        assert_eq!(clean_value(Some(&json!("nan"))), "-");
    }

    #[test]
    fn test_clean_value_trailing_dot_zero() {
        assert_eq!(clean_value(Some(&json!("1369201300074.0"))), "1369201300074");
        assert_eq!(clean_value(Some(&json!(12.0))), "12");
    }

    #[test]
    fn test_clean_value_trim() {
        assert_eq!(clean_value(Some(&json!("  DIALLO  "))), "DIALLO");
    }

    #[test]
    fn test_split_lines_filters_placeholder() {
        assert_eq!(split_lines("Ali\r\n-\nMoussa\n\n"), vec!["Ali", "Moussa"]);
    }

    #[test]
    fn test_ligne_vide() {
        assert!(ligne_vide("-", "-"));
        assert!(!ligne_vide("Ali", "-"));
    }
}
