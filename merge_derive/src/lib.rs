extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{spanned::Spanned, Data, DataStruct, DeriveInput, Fields};

/// Derive `Merge` field by field.
///
/// Every field must itself implement `Merge`; in practice that means `Option`s
/// and maps, so an unset caller field falls through to its fallback.
#[proc_macro_derive(Merge)]
pub fn merge_derive(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);
    match impl_merge(&ast) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn impl_merge(ast: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let fields = match &ast.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        Data::Struct(s) => {
            return Err(syn::Error::new(
                s.fields.span(),
                "Merge can only be derived for structs with named fields",
            ))
        }
        _ => {
            return Err(syn::Error::new(
                ast.span(),
                "Merge can only be derived for structs",
            ))
        }
    };

    let merged = fields.iter().map(|f| {
        let field = &f.ident;
        quote! {
            #field: ::merge::Merge::merge(self.#field, other.#field),
        }
    });

    Ok(quote! {
        impl #impl_generics ::merge::Merge for #name #ty_generics #where_clause {
            fn merge(self, other: Self) -> Self {
                Self {
                    #(#merged)*
                }
            }
        }
    })
}
