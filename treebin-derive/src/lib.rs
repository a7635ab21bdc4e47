//! # treebin Derive Macros
//!
//! This crate provides `#[derive(Transfer)]` for `treebin`.
//!
//! - On structs (named, tuple or unit) it implements `treebin::Transfer` with a
//!   `send` that pushes every field and a `receive` that consumes the same fields in
//!   the same order, plus a `treebin::Field` impl so the struct can be nested.
//! - On fieldless enums it implements `treebin::TransferEnum` using the `#[repr]`
//!   integer type (`i64` when none is given), plus `treebin::Field`.
//!
//! Field attributes:
//! - `#[transfer(rename = "key")]` stores the field under `key`.
//! - `#[transfer(skip)]` leaves the field out of both directions.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DataStruct, DeriveInput, Fields,
    Generics, LitStr,
};

/// Derives `Transfer` + `Field` for structs, `TransferEnum` + `Field` for enums.
#[proc_macro_derive(Transfer, attributes(transfer))]
pub fn derive_transfer(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let expanded = match &input.data {
        Data::Struct(ds) => generate_struct(&input, ds),
        Data::Enum(de) => generate_enum(&input, de),
        Data::Union(_) => Err(syn::Error::new(
            input.ident.span(),
            "Transfer cannot be derived for unions",
        )),
    };

    match expanded {
        Ok(tokens) => TokenStream::from(tokens),
        Err(e) => e.to_compile_error().into(),
    }
}

// --- Internal Data Structures ---

struct TransferField {
    /// `self.<member>` access path.
    member: syn::Member,
    /// Key in the tree.
    key: String,
}

/// Parses field attributes. Returns (skip, rename).
fn parse_attributes(attrs: &[Attribute]) -> syn::Result<(bool, Option<String>)> {
    let mut skip = false;
    let mut rename = None;

    for attr in attrs {
        if attr.path().is_ident("transfer") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    skip = true;
                    return Ok(());
                }

                if meta.path.is_ident("rename") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    rename = Some(s.value());
                    return Ok(());
                }
                Err(meta.error("Unknown transfer attribute key. Supported: skip, rename"))
            })?;
        }
    }
    Ok((skip, rename))
}

fn collect_fields(fields: &Fields) -> syn::Result<Vec<TransferField>> {
    let mut out = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let (skip, rename) = parse_attributes(&field.attrs)?;
        if skip {
            continue;
        }
        let (member, default_key) = match &field.ident {
            Some(ident) => (syn::Member::Named(ident.clone()), ident.to_string()),
            None => (syn::Member::Unnamed(syn::Index::from(index)), index.to_string()),
        };
        let key = rename.unwrap_or(default_key);
        if out.iter().any(|f: &TransferField| f.key == key) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate transfer key `{key}`"),
            ));
        }
        out.push(TransferField { member, key });
    }
    Ok(out)
}

/// Adds `T: ::treebin::Field` for every type parameter.
fn add_field_bounds(mut generics: Generics) -> Generics {
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(::treebin::Field));
    }
    generics
}

// --- Generator: structs ---

fn generate_struct(input: &DeriveInput, data: &DataStruct) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();
    let fields = collect_fields(&data.fields)?;

    let generics = add_field_bounds(input.generics.clone());
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let push_stmts = fields.iter().map(|f| {
        let member = &f.member;
        let key = &f.key;
        quote! { ser.push(#key, &self.#member)?; }
    });

    let consume_stmts = fields.iter().map(|f| {
        let member = &f.member;
        let key = &f.key;
        quote! { self.#member = de.consume(#key)?; }
    });

    // Composite fields are rebuilt from `Default` before `receive` runs.
    let mut field_generics = generics.clone();
    field_generics
        .make_where_clause()
        .predicates
        .push(parse_quote!(Self: ::core::default::Default));
    let (field_impl_generics, _, field_where_clause) = field_generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::treebin::Transfer for #name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;

            #[allow(unused_variables)]
            fn send(&self, ser: &mut ::treebin::Serializer) -> ::treebin::Result<()> {
                #(#push_stmts)*
                Ok(())
            }

            #[allow(unused_variables)]
            fn receive(&mut self, de: &mut ::treebin::Deserializer) -> ::treebin::Result<()> {
                #(#consume_stmts)*
                Ok(())
            }
        }

        impl #field_impl_generics ::treebin::Field for #name #ty_generics #field_where_clause {
            fn push_field(&self, name: &str, ser: &mut ::treebin::Serializer) -> ::treebin::Result<()> {
                ser.push_composite(name, self)
            }

            fn consume_field(name: &str, de: &mut ::treebin::Deserializer) -> ::treebin::Result<Self> {
                de.consume_composite(name)
            }
        }
    })
}

// --- Generator: enums ---

/// Reads the `#[repr(..)]` integer type, defaulting to `i64`.
fn parse_repr(attrs: &[Attribute]) -> syn::Result<syn::Ident> {
    const INTEGERS: &[&str] = &[
        "u8", "u16", "u32", "u64", "usize", "i8", "i16", "i32", "i64", "isize",
    ];

    let mut repr = None;
    for attr in attrs {
        if attr.path().is_ident("repr") {
            attr.parse_nested_meta(|meta| {
                if let Some(ident) = meta.path.get_ident() {
                    if INTEGERS.contains(&ident.to_string().as_str()) {
                        repr = Some(ident.clone());
                    }
                }
                // `align(N)` and friends carry arguments we do not need.
                if meta.input.peek(syn::token::Paren) {
                    let _args;
                    syn::parenthesized!(_args in meta.input);
                }
                Ok(())
            })?;
        }
    }
    Ok(repr.unwrap_or_else(|| format_ident!("i64")))
}

fn generate_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let type_name = name.to_string();

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Transfer enums cannot be generic",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new(
            name.span(),
            "Transfer cannot be derived for enums without variants",
        ));
    }
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Transfer enums must be fieldless; use a struct for variants with data",
            ));
        }
    }

    let repr = parse_repr(&input.attrs)?;
    let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();

    let to_arms = variants.iter().map(|v| {
        quote! { Self::#v => Self::#v as #repr, }
    });

    let from_checks = variants.iter().map(|v| {
        quote! {
            if raw == Self::#v as #repr {
                return ::core::option::Option::Some(Self::#v);
            }
        }
    });

    Ok(quote! {
        impl ::treebin::TransferEnum for #name {
            type Repr = #repr;
            const TYPE_NAME: &'static str = #type_name;

            fn to_repr(&self) -> #repr {
                match self {
                    #(#to_arms)*
                }
            }

            fn from_repr(raw: #repr) -> ::core::option::Option<Self> {
                #(#from_checks)*
                ::core::option::Option::None
            }
        }

        impl ::treebin::Field for #name {
            fn push_field(&self, name: &str, ser: &mut ::treebin::Serializer) -> ::treebin::Result<()> {
                ser.push_enum(name, self)
            }

            fn consume_field(name: &str, de: &mut ::treebin::Deserializer) -> ::treebin::Result<Self> {
                de.consume_enum(name)
            }
        }
    })
}
