pub mod client_order;
pub mod financial_title;
pub mod order_item;
pub mod outbox_event;
pub mod representative;
pub mod separation;
pub mod separation_item;

pub use client_order::Entity as ClientOrder;
pub use financial_title::Entity as FinancialTitle;
pub use order_item::Entity as OrderItem;
pub use outbox_event::Entity as OutboxEvent;
pub use representative::Entity as Representative;
pub use separation::Entity as Separation;
pub use separation_item::Entity as SeparationItem;
