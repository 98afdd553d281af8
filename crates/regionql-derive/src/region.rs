//! Region derive macro implementation
//!
//! ## Module Structure
//!
//! - `attrs`: Struct and field attribute parsing
//! - `kinds`: Mapping Rust field types to `PropertyKind`

mod attrs;
mod kinds;

use attrs::{FieldAttr, StructAttr};
use kinds::Kind;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Region cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Region can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Region can only be derived for structs",
            ));
        }
    };

    let struct_attr = StructAttr::from_attrs(&input.attrs)?;
    let region = struct_attr.name.unwrap_or_else(|| name.to_string());

    let mut declarations = Vec::new();
    let mut identity_seen = false;

    for field in fields {
        let attr = FieldAttr::from_attrs(&field.attrs)?;
        if attr.skip {
            continue;
        }

        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let property = match attr.rename {
            Some(rename) => rename,
            None => struct_attr.rename_all.apply(&ident.to_string()),
        };
        let kind = match attr.kind {
            Some(kind) => kind,
            None => kinds::infer(&field.ty),
        };
        let kind_tokens = kind.tokens();

        if attr.is_id {
            if identity_seen {
                return Err(syn::Error::new_spanned(
                    field,
                    "Region allows only one #[region(id)] field",
                ));
            }
            identity_seen = true;
            declarations.push(quote! {
                .with_identity(#property, #kind_tokens)
            });
        } else {
            declarations.push(quote! {
                .with_property(#property, #kind_tokens)
            });
        }
    }

    Ok(quote! {
        impl ::regionql::RegionEntity for #name {
            fn entity_metadata() -> &'static ::regionql::EntityMetadata {
                static METADATA: ::std::sync::OnceLock<::regionql::EntityMetadata> =
                    ::std::sync::OnceLock::new();
                METADATA.get_or_init(|| {
                    ::regionql::EntityMetadata::new(#region)
                        #(#declarations)*
                })
            }
        }
    })
}

impl Kind {
    fn tokens(self) -> TokenStream {
        let variant = match self {
            Kind::String => quote!(String),
            Kind::Integer => quote!(Integer),
            Kind::Float => quote!(Float),
            Kind::Boolean => quote!(Boolean),
            Kind::Temporal => quote!(Temporal),
            Kind::Collection => quote!(Collection),
            Kind::Object => quote!(Object),
        };
        quote!(::regionql::PropertyKind::#variant)
    }
}
