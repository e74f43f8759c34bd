//! Parsing of `#[inspect(...)]` attributes

use syn::{Attribute, LitStr};

#[derive(Default)]
pub struct ContainerAttrs {
    pub name: Option<String>,
}

#[derive(Default)]
pub struct FieldAttrs {
    pub skip: bool,
    pub parent: bool,
    pub id: bool,
    pub rename: Option<String>,
    pub visibility: Option<VisibilityTag>,
}

#[derive(Clone, Copy)]
pub enum VisibilityTag {
    Public,
    Protected,
    Private,
}

impl VisibilityTag {
    pub fn variant_name(self) -> &'static str {
        match self {
            VisibilityTag::Public => "Public",
            VisibilityTag::Protected => "Protected",
            VisibilityTag::Private => "Private",
        }
    }

    pub fn from_rust(vis: &syn::Visibility) -> Self {
        match vis {
            syn::Visibility::Public(_) => VisibilityTag::Public,
            syn::Visibility::Restricted(restricted) if restricted.path.is_ident("self") => {
                VisibilityTag::Private
            }
            syn::Visibility::Restricted(_) => VisibilityTag::Protected,
            syn::Visibility::Inherited => VisibilityTag::Private,
        }
    }
}

pub fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut parsed = ContainerAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("inspect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `name = \"...\"`"))
            }
        })?;
    }
    Ok(parsed)
}

pub fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut parsed = FieldAttrs::default();
    for attr in attrs {
        if !attr.path().is_ident("inspect") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                parsed.skip = true;
            } else if meta.path.is_ident("parent") {
                parsed.parent = true;
            } else if meta.path.is_ident("id") {
                parsed.id = true;
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.rename = Some(value.value());
            } else if meta.path.is_ident("visibility") {
                let value: LitStr = meta.value()?.parse()?;
                parsed.visibility = Some(match value.value().as_str() {
                    "public" => VisibilityTag::Public,
                    "protected" => VisibilityTag::Protected,
                    "private" => VisibilityTag::Private,
                    _ => {
                        return Err(syn::Error::new_spanned(
                            value,
                            "visibility must be \"public\", \"protected\" or \"private\"",
                        ))
                    }
                });
            } else {
                return Err(meta.error(
                    "expected one of `skip`, `parent`, `id`, `rename`, `visibility`",
                ));
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}
