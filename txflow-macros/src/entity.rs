use crate::derive_utils::apply_derives;
use crate::field_utils::ensure_leading_fields;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{
    Item, ItemStruct, LitBool, LitStr, Result, Token, Type, parse::Parse, parse::ParseStream,
    parse_macro_input,
};

/// #[entity] 宏实现
/// - 若缺失则追加字段：`id: IdType`, `version: Version`，并置于字段最前
/// - 自动实现 `::txflow_domain::entity::Entity`（new/id/version）
/// - 按 `id` 生成 PartialEq/Eq/Hash，移除用户同名派生
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[entity] only on struct")
                .to_compile_error()
                .into();
        }
    };

    if let Some(key) = args.unexpected(&["id", "debug"]) {
        return syn::Error::new(key.span(), "unknown key; expected 'id' | 'debug'")
            .to_compile_error()
            .into();
    }

    let id_ty = args.id_type();
    if let Err(err) = prepare_struct(&mut st, &id_ty, args.derive_debug(), &[]) {
        return err.to_compile_error().into();
    }

    let impls = entity_impls(&st, &id_ty);

    TokenStream::from(quote! {
        #st
        #impls
    })
}

/// 规范结构体：补齐 `id`/`version` 与额外字段，合并派生
pub(crate) fn prepare_struct(
    st: &mut ItemStruct,
    id_ty: &Type,
    derive_debug: bool,
    extra_fields: &[(&str, &Type)],
) -> Result<()> {
    let span = st.span();
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => return Err(syn::Error::new(span, "only supports named-field struct")),
    };

    let version_ty: Type = syn::parse_quote! { ::txflow_domain::value_object::Version };
    let mut required: Vec<(&str, &Type)> = vec![("id", id_ty), ("version", &version_ty)];
    required.extend_from_slice(extra_fields);
    ensure_leading_fields(fields_named, &required);

    let mut derives: Vec<syn::Path> = vec![
        syn::parse_quote!(Default),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if derive_debug {
        derives.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, derives, &["PartialEq", "Eq", "Hash"]);

    Ok(())
}

/// 生成 Entity 实现与基于标识的相等性/哈希
pub(crate) fn entity_impls(st: &ItemStruct, id_ty: &Type) -> TokenStream2 {
    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    quote! {
        impl #impl_generics ::txflow_domain::entity::Entity for #ident #ty_generics #where_clause {
            type Id = #id_ty;

            fn new(id: Self::Id) -> Self {
                Self {
                    id,
                    version: ::txflow_domain::value_object::Version::new(),
                    ..::core::default::Default::default()
                }
            }

            fn id(&self) -> &Self::Id { &self.id }

            fn version(&self) -> ::txflow_domain::value_object::Version { self.version }
        }

        impl #impl_generics ::core::cmp::PartialEq for #ident #ty_generics #where_clause {
            fn eq(&self, other: &Self) -> bool { self.id == other.id }
        }

        impl #impl_generics ::core::cmp::Eq for #ident #ty_generics #where_clause {}

        impl #impl_generics ::core::hash::Hash for #ident #ty_generics #where_clause {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                ::core::hash::Hash::hash(&self.id, state);
            }
        }
    }
}

// -------- parsing --------

/// `key = value` 形式的宏参数：`id`/`event` 为类型，`name` 为字符串，`debug` 为布尔值
#[derive(Default)]
pub(crate) struct MacroArgs {
    id_ty: Option<Type>,
    event_ty: Option<Type>,
    name: Option<LitStr>,
    derive_debug: Option<bool>,
    keys: Vec<syn::Ident>,
}

impl MacroArgs {
    pub(crate) fn id_type(&self) -> Type {
        self.id_ty
            .clone()
            .unwrap_or_else(|| syn::parse_quote! { String })
    }

    pub(crate) fn event_type(&self) -> Option<&Type> {
        self.event_ty.as_ref()
    }

    pub(crate) fn name(&self) -> Option<&LitStr> {
        self.name.as_ref()
    }

    pub(crate) fn derive_debug(&self) -> bool {
        self.derive_debug.unwrap_or(true)
    }

    /// 返回第一个不在允许列表中的键
    pub(crate) fn unexpected(&self, allowed: &[&str]) -> Option<&syn::Ident> {
        self.keys
            .iter()
            .find(|k| !allowed.iter().any(|a| *k == *a))
    }
}

enum MacroArg {
    Id(syn::Ident, Box<Type>),
    Event(syn::Ident, Box<Type>),
    Name(syn::Ident, LitStr),
    Debug(syn::Ident, bool),
}

impl Parse for MacroArg {
    fn parse(input: ParseStream) -> Result<Self> {
        let key: syn::Ident = input.parse()?;
        let _eq: Token![=] = input.parse()?;
        if key == "id" {
            Ok(MacroArg::Id(key, Box::new(input.parse()?)))
        } else if key == "event" {
            Ok(MacroArg::Event(key, Box::new(input.parse()?)))
        } else if key == "name" {
            Ok(MacroArg::Name(key, input.parse()?))
        } else if key == "debug" {
            let b: LitBool = input.parse()?;
            Ok(MacroArg::Debug(key, b.value()))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'id' | 'event' | 'name' | 'debug'",
            ))
        }
    }
}

impl Parse for MacroArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args = MacroArgs::default();
        if input.is_empty() {
            return Ok(args);
        }

        let elems = Punctuated::<MacroArg, Token![,]>::parse_terminated(input)?;
        for elem in elems.into_iter() {
            let (key, duplicated) = match elem {
                MacroArg::Id(key, ty) => {
                    let dup = args.id_ty.replace(*ty).is_some();
                    (key, dup)
                }
                MacroArg::Event(key, ty) => {
                    let dup = args.event_ty.replace(*ty).is_some();
                    (key, dup)
                }
                MacroArg::Name(key, lit) => {
                    let dup = args.name.replace(lit).is_some();
                    (key, dup)
                }
                MacroArg::Debug(key, b) => {
                    let dup = args.derive_debug.replace(b).is_some();
                    (key, dup)
                }
            };
            if duplicated {
                return Err(syn::Error::new(
                    key.span(),
                    format!("duplicate key '{key}' in attribute"),
                ));
            }
            args.keys.push(key);
        }

        Ok(args)
    }
}
