use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote, ToTokens};
use std::collections::HashSet;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Generates a `<Name>JsonSerializer` for a struct with named fields and makes
/// it the struct's `JsonType` serializer.
///
/// Attributes:
/// - `#[json(type_name = "...")]` on the struct sets the descriptor name (default: the struct name).
/// - `#[json(rename = "...")]` on a field sets the property name.
/// - `#[json(skip)]` on a field leaves it off the wire; it is rebuilt with `Default`.
///
/// Two fields with the same property name are a compile error.
#[proc_macro_derive(JsonBean, attributes(json))]
pub fn derive_json_bean(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  expand_json_bean(&input)
    .unwrap_or_else(syn::Error::into_compile_error)
    .into()
}

/// Implements `JsonEnum` and `JsonType` for an enum of unit variants, written
/// as the variant name.
///
/// Attributes:
/// - `#[json(type_name = "...")]` on the enum sets the descriptor name.
/// - `#[json(rename = "...")]` on a variant sets its wire name.
///
/// Two variants with the same wire name are a compile error.
#[proc_macro_derive(JsonEnum, attributes(json))]
pub fn derive_json_enum(input: TokenStream) -> TokenStream {
  let input = parse_macro_input!(input as DeriveInput);
  expand_json_enum(&input)
    .unwrap_or_else(syn::Error::into_compile_error)
    .into()
}

#[derive(Default)]
struct JsonAttributes {
  type_name: Option<String>,
  rename: Option<String>,
  skip: bool,
}

fn parse_json_attributes(attrs: &[syn::Attribute]) -> syn::Result<JsonAttributes> {
  let mut parsed = JsonAttributes::default();
  for attr in attrs.iter().filter(|attr| attr.path().is_ident("json")) {
    attr.parse_nested_meta(|meta| {
      if meta.path.is_ident("type_name") {
        parsed.type_name = Some(meta.value()?.parse::<LitStr>()?.value());
        Ok(())
      } else if meta.path.is_ident("rename") {
        parsed.rename = Some(meta.value()?.parse::<LitStr>()?.value());
        Ok(())
      } else if meta.path.is_ident("skip") {
        parsed.skip = true;
        Ok(())
      } else {
        Err(meta.error("unsupported json attribute"))
      }
    })?;
  }
  Ok(parsed)
}

fn reject_generics(input: &DeriveInput, derive_name: &str) -> syn::Result<()> {
  if input.generics.params.is_empty() {
    Ok(())
  } else {
    Err(syn::Error::new_spanned(
      &input.generics,
      format!("{} does not support generic types", derive_name),
    ))
  }
}

fn claim_name(seen: &mut HashSet<String>, name: &str, tokens: impl ToTokens, kind: &str) -> syn::Result<()> {
  if seen.insert(name.to_string()) {
    Ok(())
  } else {
    Err(syn::Error::new_spanned(tokens, format!("duplicate {} `{}`", kind, name)))
  }
}

fn expand_json_bean(input: &DeriveInput) -> syn::Result<TokenStream2> {
  reject_generics(input, "JsonBean")?;
  let name = &input.ident;
  let vis = &input.vis;
  let serializer_name = format_ident!("{}JsonSerializer", name);
  let container = parse_json_attributes(&input.attrs)?;
  let type_name = container.type_name.unwrap_or_else(|| name.to_string());

  let fields = match &input.data {
    Data::Struct(data) => match &data.fields {
      Fields::Named(fields) => &fields.named,
      _ => {
        return Err(syn::Error::new_spanned(
          name,
          "JsonBean requires a struct with named fields",
        ))
      }
    },
    _ => return Err(syn::Error::new_spanned(name, "JsonBean can only be derived for structs")),
  };

  let mut writes = Vec::new();
  let mut reads = Vec::new();
  let mut inits = Vec::new();
  let mut properties = HashSet::new();
  for (index, field) in fields.iter().enumerate() {
    let attributes = parse_json_attributes(&field.attrs)?;
    let Some(ident) = field.ident.as_ref() else {
      continue;
    };
    if attributes.skip {
      inits.push(quote! { #ident: ::core::default::Default::default() });
      continue;
    }
    let ty = &field.ty;
    let property = attributes.rename.unwrap_or_else(|| ident.to_string());
    claim_name(&mut properties, &property, field, "property name")?;
    let local = format_ident!("__field{}", index);
    writes.push(quote! {
      writer.write_field(#property, &value.#ident, context)?;
    });
    reads.push(quote! {
      let #local = reader.read_field::<#ty>(#property, context)?;
    });
    inits.push(quote! { #ident: #local });
  }

  Ok(quote! {
    #[derive(Debug, Default, Clone, Copy)]
    #vis struct #serializer_name;

    impl ::jsonwire_core_rs::JsonSerializer<#name> for #serializer_name {
      fn type_descriptor(&self) -> ::jsonwire_core_rs::TypeDescriptor {
        ::jsonwire_core_rs::TypeDescriptor::of(#type_name)
      }

      fn serialize(
        &self,
        value: &#name,
        context: &mut ::jsonwire_core_rs::ConnectionContext,
      ) -> ::core::result::Result<::jsonwire_core_rs::__private::Value, ::jsonwire_core_rs::SerializerError> {
        context.nested(::jsonwire_core_rs::CodecPhase::Encode, #type_name, |context| {
          #[allow(unused_mut)]
          let mut writer = ::jsonwire_core_rs::BeanWriter::new(#type_name);
          #(#writes)*
          ::core::result::Result::Ok(writer.into_value())
        })
      }

      fn deserialize(
        &self,
        type_descriptor: &::jsonwire_core_rs::TypeDescriptor,
        json: &::jsonwire_core_rs::__private::Value,
        context: &mut ::jsonwire_core_rs::ConnectionContext,
      ) -> ::core::result::Result<#name, ::jsonwire_core_rs::SerializerError> {
        ::jsonwire_core_rs::JsonSerializer::<#name>::check_type(self, type_descriptor)?;
        context.nested(::jsonwire_core_rs::CodecPhase::Decode, #type_name, |context| {
          #[allow(unused_mut)]
          let mut reader = ::jsonwire_core_rs::BeanReader::new(#type_name, json)?;
          #(#reads)*
          reader.finish(context)?;
          ::core::result::Result::Ok(#name { #(#inits),* })
        })
      }
    }

    impl ::jsonwire_core_rs::JsonType for #name {
      type Serializer = #serializer_name;
    }
  })
}

fn expand_json_enum(input: &DeriveInput) -> syn::Result<TokenStream2> {
  reject_generics(input, "JsonEnum")?;
  let name = &input.ident;
  let container = parse_json_attributes(&input.attrs)?;
  let type_name = container.type_name.unwrap_or_else(|| name.to_string());

  let Data::Enum(data) = &input.data else {
    return Err(syn::Error::new_spanned(name, "JsonEnum can only be derived for enums"));
  };

  let mut idents = Vec::new();
  let mut wire_names = Vec::new();
  let mut seen = HashSet::new();
  for variant in &data.variants {
    if !matches!(variant.fields, Fields::Unit) {
      return Err(syn::Error::new_spanned(
        variant,
        "JsonEnum variants cannot carry fields",
      ));
    }
    let attributes = parse_json_attributes(&variant.attrs)?;
    let wire_name = attributes.rename.unwrap_or_else(|| variant.ident.to_string());
    claim_name(&mut seen, &wire_name, variant, "wire name")?;
    wire_names.push(wire_name);
    idents.push(&variant.ident);
  }

  Ok(quote! {
    impl ::jsonwire_core_rs::JsonEnum for #name {
      const TYPE_NAME: &'static str = #type_name;

      fn variant_name(&self) -> &'static str {
        match self {
          #(#name::#idents => #wire_names,)*
        }
      }

      fn from_variant_name(name: &str) -> ::core::option::Option<Self> {
        match name {
          #(#wire_names => ::core::option::Option::Some(#name::#idents),)*
          _ => ::core::option::Option::None,
        }
      }

      fn variant_names() -> &'static [&'static str] {
        &[#(#wire_names),*]
      }
    }

    impl ::jsonwire_core_rs::JsonType for #name {
      type Serializer = ::jsonwire_core_rs::EnumSerializer<#name>;
    }
  })
}
