//! PostgreSQL test infrastructure.
//!
//! One PostgreSQL container is started lazily and shared by every test in the run;
//! each test gets its own freshly created database inside it.

use std::sync::OnceLock;

use postgres::{Client, NoTls};
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use tokio::runtime::Runtime;
use uuid::Uuid;

use crate::postgres::PostgresDriver;

/// Default credentials for testcontainers-modules postgres
const PG_USER: &str = "postgres";
const PG_PASSWORD: &str = "postgres";
const PG_DB: &str = "postgres";

struct SharedPostgres {
    _runtime: Runtime,
    _container: ContainerAsync<Postgres>,
    port: u16,
}

static POSTGRES: OnceLock<SharedPostgres> = OnceLock::new();

fn postgres_port() -> u16 {
    POSTGRES
        .get_or_init(|| {
            let runtime = Runtime::new().expect("failed to create tokio runtime");
            let (container, port) = runtime.block_on(async {
                let container = Postgres::default()
                    .start()
                    .await
                    .expect("failed to start postgres container");
                let port = container
                    .get_host_port_ipv4(5432)
                    .await
                    .expect("failed to get postgres port");
                (container, port)
            });
            SharedPostgres {
                _runtime: runtime,
                _container: container,
                port,
            }
        })
        .port
}

fn url_with_db(db: &str) -> String {
    format!(
        "postgres://{}:{}@127.0.0.1:{}/{}",
        PG_USER,
        PG_PASSWORD,
        postgres_port(),
        db
    )
}

/// Create a uniquely named database and return its URL.
pub fn fresh_postgres_url() -> String {
    let mut admin =
        Client::connect(&url_with_db(PG_DB), NoTls).expect("failed to connect as admin");

    // Identifiers are folded to lowercase, which the simple UUID form already is
    let db_name = format!("test_{}", Uuid::new_v4().simple());
    admin
        .batch_execute(&format!("CREATE DATABASE \"{}\"", db_name))
        .expect("failed to create test database");

    url_with_db(&db_name)
}

/// A driver connected to a fresh, isolated database.
pub fn get_test_driver() -> PostgresDriver {
    PostgresDriver::connect(&fresh_postgres_url()).expect("failed to connect to test database")
}
