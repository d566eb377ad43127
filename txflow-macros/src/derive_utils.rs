use quote::ToTokens;
use syn::{Attribute, Token};

// 提取非 derive 属性与已有 derive 列表
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) = attr.parse_args_with(
                syn::punctuated::Punctuated::<syn::Path, Token![,]>::parse_terminated,
            ) {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
pub(crate) fn derive_key(p: &syn::Path) -> String {
    match p.segments.last() {
        Some(last) => {
            let last_ident = last.ident.to_string();
            match last_ident.as_str() {
                "Serialize" | "Deserialize" => format!("serde::{}", last_ident),
                _ => last_ident,
            }
        }
        None => p.to_token_stream().to_string(),
    }
}

/// 合并默认派生与已有派生：
/// - `required` 优先且去重；
/// - `forbidden` 中的派生会被移除（例如实体的 PartialEq/Eq/Hash 由宏按标识生成）。
pub(crate) fn apply_derives(
    attrs: &mut Vec<Attribute>,
    required: Vec<syn::Path>,
    forbidden: &[&str],
) {
    let (retained, existing) = split_derives(attrs);

    let mut seen = std::collections::HashSet::<String>::new();
    let mut final_list: Vec<syn::Path> = Vec::new();
    for p in required.into_iter().chain(existing) {
        let key = derive_key(&p);
        if forbidden.contains(&key.as_str()) {
            continue;
        }
        if seen.insert(key) {
            final_list.push(p);
        }
    }

    let merged: Attribute = syn::parse_quote!(#[derive(#(#final_list),*)]);
    *attrs = std::iter::once(merged).chain(retained).collect();
}
