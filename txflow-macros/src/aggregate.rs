use crate::entity::{MacroArgs, entity_impls, prepare_struct};
use crate::field_utils::mark_serde_skip;
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, Type, parse_macro_input};

/// #[aggregate] 宏实现
/// - 补齐 `id`、`version`、`events` 字段（`events` 带 `#[serde(skip)]`）
/// - 实现 `Entity` 与 `Aggregate`（TYPE/Event/事件队列访问/版本递增）
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as Item);

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return syn::Error::new(other.span(), "#[aggregate] only on struct")
                .to_compile_error()
                .into();
        }
    };

    if let Some(key) = args.unexpected(&["id", "event", "name", "debug"]) {
        return syn::Error::new(
            key.span(),
            "unknown key; expected 'id' | 'event' | 'name' | 'debug'",
        )
        .to_compile_error()
        .into();
    }

    let Some(event_ty) = args.event_type().cloned() else {
        return syn::Error::new(
            st.ident.span(),
            "#[aggregate] requires `event = EventType`",
        )
        .to_compile_error()
        .into();
    };

    let id_ty = args.id_type();
    let queue_ty: Type = syn::parse_quote! { ::txflow_domain::domain_event::EventQueue<#event_ty> };
    if let Err(err) = prepare_struct(
        &mut st,
        &id_ty,
        args.derive_debug(),
        &[("events", &queue_ty)],
    ) {
        return err.to_compile_error().into();
    }
    if let syn::Fields::Named(fields_named) = &mut st.fields {
        mark_serde_skip(fields_named, "events");
    }

    let type_name = match args.name() {
        Some(lit) => lit.clone(),
        None => syn::LitStr::new(&st.ident.to_string(), st.ident.span()),
    };

    let entity = entity_impls(&st, &id_ty);
    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    TokenStream::from(quote! {
        #st
        #entity

        impl #impl_generics ::txflow_domain::aggregate::Aggregate for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #type_name;
            type Event = #event_ty;

            fn event_queue(&self) -> &::txflow_domain::domain_event::EventQueue<Self::Event> {
                &self.events
            }

            fn event_queue_mut(&mut self) -> &mut ::txflow_domain::domain_event::EventQueue<Self::Event> {
                &mut self.events
            }

            fn increment_version(&mut self) {
                self.version = self.version.next();
            }
        }
    })
}
