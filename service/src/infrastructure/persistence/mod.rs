pub use repository::PostgresCourseRepository;

mod columns;
mod parameters;
mod query;
mod repository;
mod result;
mod schema;
