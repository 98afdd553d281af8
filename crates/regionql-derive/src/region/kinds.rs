//! Mapping of Rust field types to `PropertyKind`.

use syn::Result;

/// Mirror of `regionql::PropertyKind`, resolved at expansion time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    String,
    Integer,
    Float,
    Boolean,
    Temporal,
    Collection,
    Object,
}

impl Kind {
    pub fn parse(lit: &syn::LitStr) -> Result<Self> {
        match lit.value().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "temporal" => Ok(Self::Temporal),
            "collection" => Ok(Self::Collection),
            "object" => Ok(Self::Object),
            other => Err(syn::Error::new_spanned(
                lit,
                format!("unknown property kind \"{other}\""),
            )),
        }
    }
}

/// Infer the kind of a field from its type.
///
/// `Option<T>`, `Box<T>`, `Arc<T>` and `Rc<T>` are looked through, references
/// are dereferenced, and unknown types are `Object`.
pub(super) fn infer(ty: &syn::Type) -> Kind {
    match ty {
        syn::Type::Reference(r) => infer(&r.elem),
        syn::Type::Paren(p) => infer(&p.elem),
        syn::Type::Group(g) => infer(&g.elem),
        syn::Type::Array(_) | syn::Type::Slice(_) => Kind::Collection,
        syn::Type::Path(type_path) => {
            let Some(seg) = type_path.path.segments.last() else {
                return Kind::Object;
            };
            let ident = seg.ident.to_string();
            match ident.as_str() {
                "Option" | "Box" | "Arc" | "Rc" => match single_type_arg(seg) {
                    Some(inner) => infer(inner),
                    None => Kind::Object,
                },
                "String" | "str" | "char" | "Cow" => Kind::String,
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64"
                | "u128" | "usize" => Kind::Integer,
                "f32" | "f64" | "Decimal" | "BigDecimal" => Kind::Float,
                "bool" => Kind::Boolean,
                "NaiveDate" | "NaiveTime" | "NaiveDateTime" | "DateTime" | "SystemTime"
                | "Date" | "Time" | "PrimitiveDateTime" | "OffsetDateTime" | "Timestamp" => {
                    Kind::Temporal
                }
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "HashMap" | "BTreeMap"
                | "IndexMap" | "IndexSet" => Kind::Collection,
                _ => Kind::Object,
            }
        }
        _ => Kind::Object,
    }
}

fn single_type_arg(seg: &syn::PathSegment) -> Option<&syn::Type> {
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}
