pub mod click_event;
pub mod short_link;

pub use click_event::Entity as ClickEventEntity;
pub use short_link::Entity as ShortLinkEntity;
