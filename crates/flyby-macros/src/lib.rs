use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, Result, Type, parse_macro_input};

/// Derives `Default` for campaign configuration sections from inline values.
///
/// Each field takes its default from a `#[default(...)]` attribute. Fields
/// without the attribute fall back to `Default::default()`, which is how a
/// top-level config embeds its sections. `String` and `PathBuf` fields accept
/// string literals and convert them with `Into`.
///
/// # Example
/// ```
/// use flyby_macros::ConfigDefaults;
/// use serde::{Deserialize, Serialize};
/// use std::path::PathBuf;
///
/// #[derive(ConfigDefaults, Serialize, Deserialize)]
/// #[serde(default)]
/// pub struct CameraSection {
///     #[default(230.0)]
///     pub lens: f64,
///
///     #[default(2464)]
///     pub resolution_x: u32,
/// }
///
/// #[derive(ConfigDefaults, Serialize, Deserialize)]
/// #[serde(default)]
/// pub struct Campaign {
///     #[default("didymos")]
///     pub series_name: String,
///
///     #[default("data/temp")]
///     pub output_dir: PathBuf,
///
///     pub camera: CameraSection,
/// }
///
/// let config = Campaign::default();
/// assert_eq!(config.series_name, "didymos");
/// assert_eq!(config.output_dir, PathBuf::from("data/temp"));
/// assert_eq!(config.camera.resolution_x, 2464);
/// ```
///
/// # Errors
///
/// Compilation fails when the derive is applied to anything other than a
/// struct with named fields, or when a `#[default()]` attribute is empty.
#[proc_macro_derive(ConfigDefaults, attributes(default))]
pub fn config_defaults(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_default_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_default_impl(input: DeriveInput) -> Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unnamed(_) | Fields::Unit => {
                return Err(Error::new_spanned(
                    &input,
                    "ConfigDefaults needs a struct with named fields",
                ));
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            return Err(Error::new_spanned(
                &input,
                "ConfigDefaults can only be derived for structs",
            ));
        }
    };

    let field_inits = fields
        .iter()
        .map(|field| {
            let Some(field_name) = field.ident.as_ref() else {
                return Err(Error::new_spanned(field, "field has no name"));
            };

            let init = match default_value(field)? {
                Some(value) if converts_from_str(&field.ty) => {
                    quote! { #field_name: ::std::convert::Into::into(#value) }
                }
                Some(value) => quote! { #field_name: #value },
                None => quote! { #field_name: ::std::default::Default::default() },
            };

            Ok(init)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::std::default::Default for #name #ty_generics #where_clause {
            fn default() -> Self {
                Self {
                    #(#field_inits),*
                }
            }
        }
    })
}

/// Owned path-like types that a string literal default is converted into.
fn converts_from_str(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };

    type_path
        .path
        .segments
        .last()
        .is_some_and(|segment| segment.ident == "String" || segment.ident == "PathBuf")
}

/// Reads the `#[default(...)]` tokens of a field, if it has the attribute.
fn default_value(field: &syn::Field) -> Result<Option<proc_macro2::TokenStream>> {
    let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("default")) else {
        return Ok(None);
    };

    let field_name = field
        .ident
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unnamed field".to_string());

    let tokens: proc_macro2::TokenStream = attr.parse_args().map_err(|e| {
        Error::new_spanned(
            attr,
            format!("could not parse #[default] on '{field_name}': {e}"),
        )
    })?;

    if tokens.is_empty() {
        return Err(Error::new_spanned(
            attr,
            format!("#[default()] on '{field_name}' is empty; give it a value or drop it"),
        ));
    }

    Ok(Some(tokens))
}
