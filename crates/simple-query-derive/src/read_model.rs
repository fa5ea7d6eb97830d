//! ReadModel derive macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, Result};

struct FieldMapping {
    column: Option<String>,
    skip: bool,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let model_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "ReadModel can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "ReadModel can only be derived for structs",
            ));
        }
    };

    let mut attributes = Vec::new();
    let mut initializers = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let mapping = parse_field(field)?;
        if mapping.skip {
            initializers.push(quote! {
                #field_name: ::core::default::Default::default()
            });
            continue;
        }

        let attribute = field_name.to_string();
        let attribute = attribute.strip_prefix("r#").unwrap_or(&attribute).to_string();
        let column = mapping.column.unwrap_or_else(|| attribute.clone());
        attributes.push(quote! {
            ::simple_query::Attribute { name: #attribute, column: #column }
        });
        initializers.push(quote! {
            #field_name: row.attribute(#column)?
        });
    }

    Ok(quote! {
        impl #impl_generics ::simple_query::ReadModel for #name #ty_generics #where_clause {
            fn attributes() -> &'static [::simple_query::Attribute] {
                const ATTRIBUTES: &[::simple_query::Attribute] = &[#(#attributes),*];
                ATTRIBUTES
            }

            fn from_row(
                row: &::simple_query::RowView<'_>,
            ) -> ::simple_query::QueryResult<Self> {
                Ok(Self {
                    #(#initializers),*
                })
            }

            fn name() -> &'static str {
                #model_name
            }
        }
    })
}

fn parse_field(field: &syn::Field) -> Result<FieldMapping> {
    let mut mapping = FieldMapping {
        column: None,
        skip: false,
    };
    for attr in &field.attrs {
        if !attr.path().is_ident("read_model") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                if lit.value().is_empty() {
                    return Err(meta.error("column name cannot be empty"));
                }
                mapping.column = Some(lit.value());
                Ok(())
            } else if meta.path.is_ident("skip") {
                mapping.skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown read_model attribute, expected `column` or `skip`"))
            }
        })?;
    }
    if mapping.skip && mapping.column.is_some() {
        return Err(syn::Error::new_spanned(
            field,
            "`skip` and `column` cannot be combined",
        ));
    }
    Ok(mapping)
}
