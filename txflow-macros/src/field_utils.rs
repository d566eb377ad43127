use proc_macro2::Span;
use syn::{Field, FieldsNamed, Ident, Token, Type, punctuated::Punctuated};

fn field_is(f: &Field, name: &str) -> bool {
    f.ident.as_ref().map(|i| i == name).unwrap_or(false)
}

/// 确保具名字段结构体包含所需字段，并把它们按给定顺序放在最前。
/// 已存在的同名字段会被复用（保留用户的属性与类型），其余字段保持原始相对顺序。
pub(crate) fn ensure_leading_fields(fields_named: &mut FieldsNamed, required: &[(&str, &Type)]) {
    let old_named = fields_named.named.clone();
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required.iter() {
        if let Some(existing) = old_named.iter().find(|f| field_is(f, name)) {
            new_named.push(existing.clone());
        } else {
            let ident = Ident::new(name, Span::call_site());
            let field: Field = syn::parse_quote! { #ident: #ty };
            new_named.push(field);
        }
    }

    for f in old_named.into_iter() {
        if !required.iter().any(|(n, _)| field_is(&f, n)) {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}

/// 为指定字段追加 `#[serde(skip)]`（已带 serde skip 时不重复追加）
pub(crate) fn mark_serde_skip(fields_named: &mut FieldsNamed, name: &str) {
    for f in fields_named.named.iter_mut() {
        if !field_is(f, name) {
            continue;
        }
        let already = f.attrs.iter().any(|a| {
            a.path().is_ident("serde")
                && a.meta
                    .require_list()
                    .map(|l| l.tokens.to_string().contains("skip"))
                    .unwrap_or(false)
        });
        if !already {
            f.attrs.push(syn::parse_quote!(#[serde(skip)]));
        }
    }
}
