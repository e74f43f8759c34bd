//! Implementation of #[derive(Inspect)]

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, parse_macro_input, parse_quote, Data, DataEnum, DataStruct, DeriveInput,
    Fields, Ident, Index,
};

use crate::attrs::{parse_container_attrs, parse_field_attrs, ContainerAttrs, VisibilityTag};

pub fn derive_inspect_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let container = parse_container_attrs(&input.attrs)?;

    let mut generics = input.generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::dev_debug::Inspect));
    }

    let body = match &input.data {
        Data::Struct(data) => expand_struct(&container, data)?,
        Data::Enum(data) => expand_enum(&container, data)?,
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Inspect cannot be derived for unions",
            ))
        }
    };

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let inspect_body = body.inspect;
    let object_impl = body.object.map(|object_body| {
        quote! {
            impl #impl_generics ::dev_debug::Object for #name #ty_generics #where_clause {
                #object_body
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::dev_debug::Inspect for #name #ty_generics #where_clause {
            fn inspect(
                &self,
                normalizer: &mut ::dev_debug::Normalizer,
            ) -> ::dev_debug::NormalizedNode {
                #inspect_body
            }
        }

        #object_impl
    })
}

struct Expansion {
    inspect: TokenStream2,
    object: Option<TokenStream2>,
}

/// A field that will be reported, with the expression that borrows it.
struct Reported {
    access: TokenStream2,
    name: String,
    visibility: VisibilityTag,
    parent: bool,
}

impl Reported {
    fn statement(&self) -> TokenStream2 {
        let access = &self.access;
        if self.parent {
            return quote! { fields.parent(#access); };
        }
        let name = &self.name;
        let visibility = format_ident!("{}", self.visibility.variant_name());
        quote! {
            fields.field(#name, ::dev_debug::Visibility::#visibility, #access);
        }
    }
}

fn field_name(ident: Option<&Ident>, index: usize) -> String {
    match ident {
        Some(ident) => ident.unraw().to_string(),
        None => index.to_string(),
    }
}

fn expand_struct(container: &ContainerAttrs, data: &DataStruct) -> syn::Result<Expansion> {
    let mut reported = Vec::new();
    let mut object_id = None;

    for (index, field) in data.fields.iter().enumerate() {
        let attrs = parse_field_attrs(&field.attrs)?;
        let member = match &field.ident {
            Some(ident) => quote! { #ident },
            None => {
                let index = Index::from(index);
                quote! { #index }
            }
        };

        if attrs.id {
            if object_id.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may carry #[inspect(id)]",
                ));
            }
            object_id = Some(member);
            continue;
        }
        if attrs.skip {
            continue;
        }

        reported.push(Reported {
            access: quote! { &self.#member },
            name: attrs
                .rename
                .unwrap_or_else(|| field_name(field.ident.as_ref(), index)),
            visibility: attrs
                .visibility
                .unwrap_or_else(|| VisibilityTag::from_rust(&field.vis)),
            parent: attrs.parent,
        });
    }

    let type_name = container.name.as_ref().map(|type_name| {
        quote! {
            fn type_name(&self) -> ::std::borrow::Cow<'_, str> {
                ::std::borrow::Cow::Borrowed(#type_name)
            }
        }
    });
    let object_id = object_id.map(|member| {
        quote! {
            fn object_id(&self) -> ::std::option::Option<&::dev_debug::ObjectId> {
                ::std::option::Option::Some(&self.#member)
            }
        }
    });

    let statements = reported.iter().map(Reported::statement);
    let fields_param = if reported.is_empty() {
        Ident::new("_fields", Span::call_site())
    } else {
        Ident::new("fields", Span::call_site())
    };

    Ok(Expansion {
        inspect: quote! { normalizer.object(self) },
        object: Some(quote! {
            #type_name
            #object_id

            fn fields(&self, #fields_param: &mut ::dev_debug::Fields<'_>) {
                #(#statements)*
            }
        }),
    })
}

fn expand_enum(container: &ContainerAttrs, data: &DataEnum) -> syn::Result<Expansion> {
    if data.variants.is_empty() {
        return Ok(Expansion {
            inspect: quote! { match *self {} },
            object: None,
        });
    }

    let base = match &container.name {
        Some(type_name) => quote! { #type_name },
        None => quote! { ::std::any::type_name::<Self>() },
    };

    let mut inspect_arms = Vec::new();
    let mut type_name_arms = Vec::new();
    let mut field_arms = Vec::new();
    let mut has_data = false;

    for variant in &data.variants {
        let ident = &variant.ident;
        let variant_name = ident.unraw().to_string();

        if let Fields::Unit = variant.fields {
            inspect_arms.push(quote! {
                Self::#ident => normalizer.scalar(#variant_name),
            });
            type_name_arms.push(quote! {
                Self::#ident => ::std::borrow::Cow::Owned(
                    ::std::format!("{}::{}", #base, #variant_name)
                ),
            });
            field_arms.push(quote! { Self::#ident => {} });
            continue;
        }
        has_data = true;

        let mut bindings = Vec::new();
        let mut reported = Vec::new();
        for (index, field) in variant.fields.iter().enumerate() {
            let attrs = parse_field_attrs(&field.attrs)?;
            if attrs.id {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[inspect(id)] is not supported on enum variants",
                ));
            }
            if attrs.skip {
                continue;
            }
            let binding = format_ident!("__field{}", index);
            bindings.push((field.ident.clone(), index, binding.clone()));
            reported.push(Reported {
                access: quote! { #binding },
                name: attrs
                    .rename
                    .unwrap_or_else(|| field_name(field.ident.as_ref(), index)),
                visibility: attrs.visibility.unwrap_or(VisibilityTag::Public),
                parent: attrs.parent,
            });
        }

        let pattern_fields = bindings.iter().map(|(field_ident, index, binding)| {
            match field_ident {
                Some(field_ident) => quote! { #field_ident: #binding },
                None => {
                    let index = Index::from(*index);
                    quote! { #index: #binding }
                }
            }
        });
        let statements = reported.iter().map(Reported::statement);
        field_arms.push(quote! {
            Self::#ident { #(#pattern_fields,)* .. } => {
                #(#statements)*
            }
        });
        type_name_arms.push(quote! {
            Self::#ident { .. } => ::std::borrow::Cow::Owned(
                ::std::format!("{}::{}", #base, #variant_name)
            ),
        });
    }

    if has_data {
        inspect_arms.push(quote! { _ => normalizer.object(self), });
    }
    let inspect = quote! {
        match self {
            #(#inspect_arms)*
        }
    };
    if !has_data {
        return Ok(Expansion {
            inspect,
            object: None,
        });
    }

    Ok(Expansion {
        inspect,
        object: Some(quote! {
            fn type_name(&self) -> ::std::borrow::Cow<'_, str> {
                match self {
                    #(#type_name_arms)*
                }
            }

            #[allow(unused_variables)]
            fn fields(&self, fields: &mut ::dev_debug::Fields<'_>) {
                match self {
                    #(#field_arms)*
                }
            }
        }),
    })
}
