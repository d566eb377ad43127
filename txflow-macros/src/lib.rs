//! txflow 过程宏
//!
//! - `#[entity]`：为具名字段结构体补齐 `id`/`version` 字段并实现 `Entity`；
//! - `#[aggregate]`：在 `#[entity]` 基础上补齐待发布事件队列并实现 `Aggregate`；
//! - `#[event]`：为事件枚举/结构体实现 `DomainEvent`（事件类型与载荷版本）；
//! - `#[entity_id]`：为单字段 tuple struct 形式的标识类型生成常用转换。
//!
//! 生成代码统一通过 `::txflow_domain` 路径引用领域层类型。
use proc_macro::TokenStream;

mod aggregate;
mod derive_utils;
mod domain_event;
mod entity;
mod entity_id;
mod field_utils;

/// 实体宏
///
/// - 补齐字段：`id: IdType`, `version: Version`（若缺失）并置于字段最前
/// - 实现 `::txflow_domain::entity::Entity`，相等性与哈希仅基于 `id`
/// - 参数：`#[entity(id = IdType, debug = true|false)]`，`id` 默认 `String`
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity::expand(attr, item)
}

/// 聚合宏
///
/// - 在 `#[entity]` 的基础上补齐 `events: EventQueue<EventType>` 字段（不参与序列化）
/// - 实现 `::txflow_domain::aggregate::Aggregate`
/// - 参数：`#[aggregate(event = EventType, id = IdType, name = "order", debug = bool)]`，
///   `event` 必填，`name` 默认取结构体名
#[proc_macro_attribute]
pub fn aggregate(attr: TokenStream, item: TokenStream) -> TokenStream {
    aggregate::expand(attr, item)
}

/// 领域事件宏
///
/// - 枚举：事件类型默认 `Enum.Variant`，变体可通过
///   `#[event(event_type = "...", event_version = N)]` 覆写
/// - 结构体：事件类型默认取结构体名，可通过 `#[event(event_type = "...")]` 覆写
/// - `#[event(version = N)]` 指定默认载荷版本（默认 1）
#[proc_macro_attribute]
pub fn event(attr: TokenStream, item: TokenStream) -> TokenStream {
    domain_event::expand(attr, item)
}

/// 实体 ID 宏（单字段 tuple struct，例如 `struct OrderId(u64);`）
#[proc_macro_attribute]
pub fn entity_id(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_id::expand(attr, item)
}
