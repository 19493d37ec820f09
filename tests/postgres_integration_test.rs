/// PostgreSQLでの統合テスト
///
/// testcontainersでPostgreSQLを起動し、同梱のPostgreSQL用マイグレーションとクエリ
/// （UUID/JSONB/BYTEA）を検証します。
///
/// 注意: Docker必須のため #[ignore] でマークされています。
/// 実行するには: `cargo test -- --ignored`

#[cfg(test)]
mod postgres_integration_tests {
    use credstore::adapters::database::DatabaseConnectionService;
    use credstore::core::account::NewAccount;
    use credstore::core::config::{DatabaseConfig, Dialect};
    use credstore::core::passkey::{CredentialPayload, PasskeyUser, PasskeyUserCredential};
    use credstore::services::account_repository::AccountRepository;
    use credstore::services::passkey_repository::PasskeyRepository;
    use credstore::services::query_catalog::QueryCatalog;
    use credstore::services::schema_store::SchemaStore;
    use serde_json::json;
    use sqlx::AnyPool;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::postgres::Postgres as PostgresImage;
    use uuid::Uuid;

    /// PostgreSQLコンテナを起動して接続プールを作成
    async fn setup_postgres_container(
    ) -> Result<(ContainerAsync<PostgresImage>, AnyPool), Box<dyn std::error::Error>> {
        let container = PostgresImage::default()
            .with_tag("16-alpine")
            .start()
            .await?;

        let config = DatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: Some(container.get_host_port_ipv4(5432).await?),
            database: "postgres".to_string(),
            user: Some("postgres".to_string()),
            password: Some("postgres".to_string()),
            timeout: Some(30),
        };

        let pool = DatabaseConnectionService::new()
            .create_pool(Dialect::PostgreSQL, &config, None)
            .await?;

        Ok((container, pool))
    }

    fn ana() -> NewAccount {
        NewAccount {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_plain: "x".to_string(),
            password_hashed: "x".to_string(),
            password_salted: "x".to_string(),
            password_peppered: "x".to_string(),
            password_salted_and_peppered: "x".to_string(),
        }
    }

    /// PostgreSQLでの同梱スキーマとクエリのテスト
    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_bundled_schema_and_queries() {
        let (_container, pool) = setup_postgres_container().await.unwrap();

        let store = SchemaStore::bundled(Dialect::PostgreSQL).unwrap();
        assert_eq!(store.apply(&pool).await.unwrap().applied.len(), 3);
        assert!(store.apply(&pool).await.unwrap().is_noop());

        let catalog = QueryCatalog::bundled(Dialect::PostgreSQL).unwrap();
        let accounts = AccountRepository::new(&pool, &catalog);

        let id = accounts.create(&ana()).await.unwrap();
        assert_eq!(
            accounts.get_by_mail("ana@example.com").await.unwrap(),
            Some(ana().into_account(id))
        );
        assert!(accounts.get_by_mail("nobody@example.com").await.unwrap().is_none());
        assert!(accounts.create(&ana()).await.unwrap_err().is_conflict());

        let passkeys = PasskeyRepository::new(&pool, &catalog);
        let user = PasskeyUser::new("ana@example.com", "Ana");
        passkeys.create_user(&user).await.unwrap();
        assert_eq!(passkeys.get_user_by_id(user.id).await.unwrap(), Some(user.clone()));

        let credential = PasskeyUserCredential {
            credential_id: vec![1, 2, 3],
            user_id: user.id,
            credential: CredentialPayload::from(json!({"format": "fido-u2f", "handle": "abc"})),
        };
        passkeys.create_credential(&credential).await.unwrap();
        assert!(passkeys.create_credential(&credential).await.unwrap_err().is_conflict());

        let orphan = PasskeyUserCredential {
            credential_id: vec![4, 5, 6],
            user_id: Uuid::new_v4(),
            credential: credential.credential.clone(),
        };
        assert!(passkeys.create_credential(&orphan).await.unwrap_err().is_foreign_key());

        let stored = passkeys.get_credentials(user.id).await.unwrap();
        assert_eq!(stored, vec![credential]);
    }
}
