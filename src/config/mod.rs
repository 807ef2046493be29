mod settings;

pub use settings::DeliveryConfig;
