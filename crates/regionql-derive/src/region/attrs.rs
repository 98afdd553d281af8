//! Attribute parsing for Region derive macro.
//!
//! Handles parsing of struct-level and field-level `#[region(...)]` attributes.

use super::kinds::Kind;
use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use syn::{Attribute, Result};

/// Struct-level `rename_all` rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) enum RenameRule {
    #[default]
    None,
    CamelCase,
    SnakeCase,
    PascalCase,
    LowerCase,
}

impl RenameRule {
    fn parse(lit: &syn::LitStr) -> Result<Self> {
        match lit.value().as_str() {
            "camelCase" => Ok(Self::CamelCase),
            "snake_case" => Ok(Self::SnakeCase),
            "PascalCase" => Ok(Self::PascalCase),
            "lowercase" => Ok(Self::LowerCase),
            other => Err(syn::Error::new_spanned(
                lit,
                format!(
                    "unknown rename_all rule \"{other}\", expected camelCase, snake_case, PascalCase or lowercase"
                ),
            )),
        }
    }

    pub fn apply(self, field: &str) -> String {
        let field = field.strip_prefix("r#").unwrap_or(field);
        match self {
            Self::None => field.to_string(),
            Self::CamelCase => field.to_lower_camel_case(),
            Self::SnakeCase => field.to_snake_case(),
            Self::PascalCase => field.to_upper_camel_case(),
            Self::LowerCase => field.to_lowercase(),
        }
    }
}

/// Parsed `#[region(name = "...", rename_all = "...")]`.
#[derive(Default)]
pub(super) struct StructAttr {
    pub name: Option<String>,
    pub rename_all: RenameRule,
}

impl StructAttr {
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("region")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    let name = lit.value();
                    if name.trim_start_matches('/').is_empty() {
                        return Err(meta.error("region name must not be empty"));
                    }
                    out.name = Some(name);
                    Ok(())
                } else if meta.path.is_ident("rename_all") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    out.rename_all = RenameRule::parse(&lit)?;
                    Ok(())
                } else {
                    Err(meta.error("unsupported region attribute, expected `name` or `rename_all`"))
                }
            })?;
        }
        Ok(out)
    }
}

/// Parsed field-level `#[region(id, rename = "...", kind = "...", skip)]`.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub skip: bool,
    pub rename: Option<String>,
    pub kind: Option<Kind>,
}

impl FieldAttr {
    pub fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut out = Self::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("region")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    out.is_id = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    out.skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                    Ok(())
                } else if meta.path.is_ident("kind") {
                    let lit: syn::LitStr = meta.value()?.parse()?;
                    out.kind = Some(Kind::parse(&lit)?);
                    Ok(())
                } else {
                    Err(meta.error(
                        "unsupported region attribute, expected `id`, `skip`, `rename` or `kind`",
                    ))
                }
            })?;
        }
        if out.skip && out.is_id {
            return Err(syn::Error::new_spanned(
                &attrs[0],
                "an identity field cannot be skipped",
            ));
        }
        Ok(out)
    }
}
