pub mod chat;
pub mod price_chart;
pub mod response_card;
