use crate::derive_utils::apply_derives;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashMap;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Ident, Item, ItemEnum, ItemStruct, Lit, LitInt, LitStr, Result, Token, parse::Parse,
    parse::ParseStream, parse_macro_input,
};

/// #[event] 宏实现
/// - 合并/追加默认派生：Debug, Clone, PartialEq, Serialize, Deserialize
/// - 生成 `::txflow_domain::domain_event::DomainEvent` 实现（event_type/event_version）
/// - 枚举：支持具名、元组与单元变体，变体可写 `#[event(event_type = "...", event_version = N)]`
/// - 结构体：可在宏参数中写 `event_type = "..."`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let cfg = parse_macro_input!(attr as EventAttrConfig);
    let input = parse_macro_input!(item as Item);

    let result = match input {
        Item::Enum(e) => expand_enum(cfg, e),
        Item::Struct(s) => expand_struct(cfg, s),
        other => Err(syn::Error::new(
            other.span(),
            "#[event] can only be used on enum or struct types",
        )),
    };

    match result {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn default_derives() -> Vec<syn::Path> {
    vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ]
}

fn expand_enum(cfg: EventAttrConfig, mut enum_item: ItemEnum) -> Result<TokenStream2> {
    if let Some(lit) = &cfg.event_type {
        return Err(syn::Error::new(
            lit.span(),
            "'event_type' is set per variant on enums: #[event(event_type = \"...\")]",
        ));
    }

    let version_lit = cfg.version_or_default();
    apply_derives(&mut enum_item.attrs, default_derives(), &[]);

    let mut variant_types: HashMap<String, LitStr> = HashMap::new();
    let mut variant_versions: HashMap<String, LitInt> = HashMap::new();

    for v in &mut enum_item.variants {
        let mut retained_attrs = Vec::new();
        let mut type_lit: Option<LitStr> = None;
        let mut version_lit_local: Option<LitInt> = None;

        for attr in v.attrs.iter() {
            if !attr.path().is_ident("event") {
                retained_attrs.push(attr.clone());
                continue;
            }
            let overrides = attr.parse_args_with(
                Punctuated::<EventAttrKv, Token![,]>::parse_terminated,
            )?;
            for kv in overrides {
                match (kv.key.to_string().as_str(), kv.value) {
                    ("event_type", Lit::Str(lit)) => {
                        if type_lit.replace(lit).is_some() {
                            return Err(syn::Error::new(
                                kv.key.span(),
                                "duplicate 'event_type' specified for this variant",
                            ));
                        }
                    }
                    ("event_version", Lit::Int(lit)) => {
                        if version_lit_local.replace(lit).is_some() {
                            return Err(syn::Error::new(
                                kv.key.span(),
                                "duplicate 'event_version' specified for this variant",
                            ));
                        }
                    }
                    _ => {
                        return Err(syn::Error::new(
                            kv.key.span(),
                            "expected `event_type = \"...\"` or `event_version = N`",
                        ));
                    }
                }
            }
        }

        v.attrs = retained_attrs;
        if let Some(lit) = type_lit {
            variant_types.insert(v.ident.to_string(), lit);
        }
        if let Some(lit) = version_lit_local {
            variant_versions.insert(v.ident.to_string(), lit);
        }
    }

    let enum_ident = &enum_item.ident;
    let enum_name = enum_ident.to_string();

    // `Self::V { .. }` 同时匹配具名、元组与单元变体
    let type_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let lit = variant_types.get(&v_ident.to_string()).cloned().unwrap_or_else(|| {
            LitStr::new(&format!("{}.{}", enum_name, v_ident), v_ident.span())
        });
        quote! { Self::#v_ident { .. } => #lit }
    });

    let ver_match_arms = enum_item.variants.iter().map(|v| {
        let v_ident = &v.ident;
        let lit = variant_versions
            .get(&v_ident.to_string())
            .cloned()
            .unwrap_or_else(|| version_lit.clone());
        quote! { Self::#v_ident { .. } => #lit }
    });

    let (impl_generics, ty_generics, where_clause) = enum_item.generics.split_for_impl();

    Ok(quote! {
        #enum_item

        impl #impl_generics ::txflow_domain::domain_event::DomainEvent for #enum_ident #ty_generics #where_clause {
            fn event_type(&self) -> &str {
                match self { #( #type_match_arms, )* }
            }

            fn event_version(&self) -> usize {
                match self { #( #ver_match_arms, )* }
            }
        }
    })
}

fn expand_struct(cfg: EventAttrConfig, mut st: ItemStruct) -> Result<TokenStream2> {
    apply_derives(&mut st.attrs, default_derives(), &[]);

    let ident = &st.ident;
    let type_lit = cfg
        .event_type
        .clone()
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));
    let version_lit = cfg.version_or_default();
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    Ok(quote! {
        #st

        impl #impl_generics ::txflow_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            fn event_type(&self) -> &str { #type_lit }

            fn event_version(&self) -> usize { #version_lit }
        }
    })
}

// -------- parsing --------

struct EventAttrKv {
    key: Ident,
    value: Lit,
}

impl Parse for EventAttrKv {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        let value: Lit = input.parse()?;
        Ok(Self { key, value })
    }
}

// 顶层配置：默认载荷版本号、（仅结构体）事件类型
#[derive(Default)]
struct EventAttrConfig {
    version: Option<LitInt>,
    event_type: Option<LitStr>,
}

impl EventAttrConfig {
    fn version_or_default(&self) -> LitInt {
        self.version
            .clone()
            .unwrap_or_else(|| syn::parse_quote! { 1 })
    }
}

impl Parse for EventAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = EventAttrConfig::default();
        if input.is_empty() {
            return Ok(cfg);
        }

        let pairs = Punctuated::<EventAttrKv, Token![,]>::parse_terminated(input)?;
        for kv in pairs {
            let duplicated = match (kv.key.to_string().as_str(), kv.value) {
                ("version", Lit::Int(lit)) => cfg.version.replace(lit).is_some(),
                ("event_type", Lit::Str(lit)) => cfg.event_type.replace(lit).is_some(),
                _ => {
                    return Err(syn::Error::new(
                        kv.key.span(),
                        "unknown key; expected `version = N` | `event_type = \"...\"`",
                    ));
                }
            };
            if duplicated {
                return Err(syn::Error::new(
                    kv.key.span(),
                    format!("duplicate key '{}' in attribute", kv.key),
                ));
            }
        }

        Ok(cfg)
    }
}
