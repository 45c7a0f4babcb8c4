pub mod catalog;
pub mod provider;
pub mod recent;
pub mod resolver;
pub mod unsplash;

pub use catalog::QueryCatalog;
pub use provider::PhotoProvider;
pub use recent::RecentImages;
pub use resolver::{ImageResolver, ResolvedImage, ResolverSettings};
pub use unsplash::UnsplashClient;
