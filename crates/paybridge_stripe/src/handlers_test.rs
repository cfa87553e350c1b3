#[cfg(test)]
mod tests {
    use crate::error::StripeError;
    use crate::handlers::StripeState;
    use crate::models::{
        BillingDetails, CardDetails, Customer, EphemeralKey, Invoice, InvoiceItem,
        PaymentIntent, PaymentMethod, SetupIntent,
    };
    use crate::routes::routes;
    use crate::service::MockPaymentGateway;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
        Router,
    };
    use paybridge_common::UNKNOWN_ERROR_MESSAGE;
    use paybridge_config::{AppConfig, StoreConfig};
    use paybridge_store::{
        CustomerMapRepository, SqlCustomerMapRepository, StoreClient, CUSTOMERS_BUCKET,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_config() -> Arc<AppConfig> {
        Arc::new(
            serde_json::from_value(json!({
                "server": { "host": "127.0.0.1", "port": 4242 },
                "store": { "path": "unused.db" },
                "stripe": {
                    "secret_key": "sk_test_123",
                    "publishable_key": "pk_test_123"
                }
            }))
            .unwrap(),
        )
    }

    async fn temp_store() -> (TempDir, SqlCustomerMapRepository) {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            path: dir.path().join("customers.db").to_string_lossy().into_owned(),
            open_timeout_ms: 2000,
            max_connections: 5,
        };
        let client = StoreClient::open(&config, &[CUSTOMERS_BUCKET]).await.unwrap();
        (dir, SqlCustomerMapRepository::new(client))
    }

    fn app(
        gateway: MockPaymentGateway,
        customers: Option<SqlCustomerMapRepository>,
    ) -> (Router, Arc<StripeState>) {
        let state = Arc::new(StripeState::new(
            test_config(),
            Arc::new(gateway),
            customers,
        ));
        (routes(state.clone()), state)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn intent(id: &str, secret: &str) -> PaymentIntent {
        PaymentIntent {
            id: id.to_string(),
            client_secret: Some(secret.to_string()),
            ..Default::default()
        }
    }

    fn card(id: &str, brand: &str, holder: Option<&str>) -> PaymentMethod {
        PaymentMethod {
            id: id.to_string(),
            method_type: "card".to_string(),
            customer: Some("cus_1".to_string()),
            card: Some(CardDetails {
                brand: brand.to_string(),
                exp_month: 12,
                exp_year: 2030,
                funding: "credit".to_string(),
                last4: "4242".to_string(),
            }),
            billing_details: BillingDetails {
                name: holder.map(str::to_string),
                email: None,
            },
        }
    }

    fn payment_intent_body(user_id: &str) -> Value {
        json!({
            "currency": "usd",
            "paymentMethodType": "card",
            "customerName": "Jenny Rosen",
            "customerEmail": "jenny.rosen@example.com",
            "userID": user_id
        })
    }

    #[tokio::test]
    async fn test_config_returns_publishable_key() {
        let (router, _) = app(MockPaymentGateway::new(), None);

        let response = router.oneshot(empty("GET", "/config")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "publishableKey": "pk_test_123" }));
    }

    #[tokio::test]
    async fn test_create_setup_intent() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_customer()
            .withf(|params| params.name.is_none() && params.email.is_none())
            .times(1)
            .returning(|_| {
                Ok(Customer {
                    id: "cus_anon".to_string(),
                    name: None,
                    email: None,
                })
            });
        gateway
            .expect_create_setup_intent()
            .withf(|params| params.customer == "cus_anon" && params.usage == "on_session")
            .times(1)
            .returning(|_| {
                Ok(SetupIntent {
                    id: "seti_1".to_string(),
                    client_secret: Some("seti_1_secret".to_string()),
                })
            });
        let (router, _) = app(gateway, None);

        let response = router
            .oneshot(empty("GET", "/create-setup-intent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "setupClientSecret": "seti_1_secret" })
        );
    }

    #[tokio::test]
    async fn test_create_setup_intent_is_get_only() {
        let (router, _) = app(MockPaymentGateway::new(), None);
        let response = router
            .oneshot(empty("POST", "/create-setup-intent"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_create_payment_intent_provisions_new_user() {
        let (_dir, customers) = temp_store().await;
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_customer()
            .withf(|params| {
                params.name.as_deref() == Some("Jenny Rosen")
                    && params.email.as_deref() == Some("jenny.rosen@example.com")
            })
            .times(1)
            .returning(|_| {
                Ok(Customer {
                    id: "cus_new".to_string(),
                    name: Some("Jenny Rosen".to_string()),
                    email: None,
                })
            });
        gateway
            .expect_create_ephemeral_key()
            .withf(|customer_id| customer_id == "cus_new")
            .times(1)
            .returning(|_| {
                Ok(EphemeralKey {
                    id: "ephkey_1".to_string(),
                    secret: "ek_secret".to_string(),
                })
            });
        gateway
            .expect_create_payment_intent()
            .withf(|params| {
                params.amount == 1999
                    && params.currency == "usd"
                    && params.payment_method_types == vec!["card".to_string()]
                    && params.customer.as_deref() == Some("cus_new")
                    && params.confirm.is_none()
            })
            .times(1)
            .returning(|_| Ok(intent("pi_1", "pi_1_secret")));
        let (router, state) = app(gateway, Some(customers.clone()));

        let response = router
            .oneshot(post_json("/create-payment-intent", payment_intent_body("user-1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "clientSecret": "pi_1_secret",
                "customerID": "cus_new",
                "ephemeralKey": "ek_secret"
            })
        );
        assert_eq!(
            customers.get_customer("user-1").await.unwrap().as_deref(),
            Some("cus_new")
        );
        assert_eq!(state.last_payment_intent().await.as_deref(), Some("pi_1"));
    }

    #[tokio::test]
    async fn test_create_payment_intent_reuses_stored_customer() {
        let (_dir, customers) = temp_store().await;
        customers.add_customer("user-1", "cus_existing").await.unwrap();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_customer().times(0);
        gateway
            .expect_create_ephemeral_key()
            .withf(|customer_id| customer_id == "cus_existing")
            .returning(|_| {
                Ok(EphemeralKey {
                    id: "ephkey_1".to_string(),
                    secret: "ek_secret".to_string(),
                })
            });
        gateway
            .expect_create_payment_intent()
            .withf(|params| params.customer.as_deref() == Some("cus_existing"))
            .returning(|_| Ok(intent("pi_2", "pi_2_secret")));
        let (router, _) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json("/create-payment-intent", payment_intent_body("user-1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["customerID"], "cus_existing");
    }

    #[tokio::test]
    async fn test_concurrent_first_requests_create_one_customer() {
        let (_dir, customers) = temp_store().await;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_customer().times(1).returning(|_| {
            Ok(Customer {
                id: "cus_once".to_string(),
                name: None,
                email: None,
            })
        });
        gateway.expect_create_ephemeral_key().returning(|_| {
            Ok(EphemeralKey {
                id: "ephkey_1".to_string(),
                secret: "ek_secret".to_string(),
            })
        });
        gateway
            .expect_create_payment_intent()
            .returning(|_| Ok(intent("pi_1", "pi_1_secret")));
        let (router, _) = app(gateway, Some(customers.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let router = router.clone();
            handles.push(tokio::spawn(async move {
                let response = router
                    .oneshot(post_json("/create-payment-intent", payment_intent_body("racer")))
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                body_json(response).await["customerID"]
                    .as_str()
                    .unwrap()
                    .to_string()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "cus_once");
        }
        assert_eq!(
            customers.get_customer("racer").await.unwrap().as_deref(),
            Some("cus_once")
        );
    }

    #[tokio::test]
    async fn test_gateway_rejection_is_400_with_its_message() {
        let (_dir, customers) = temp_store().await;
        customers.add_customer("user-1", "cus_1").await.unwrap();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_ephemeral_key().returning(|_| {
            Ok(EphemeralKey {
                id: "ephkey_1".to_string(),
                secret: "ek_secret".to_string(),
            })
        });
        gateway.expect_create_payment_intent().returning(|_| {
            Err(StripeError::ApiError {
                status_code: 400,
                code: Some("parameter_invalid_empty".to_string()),
                message: "Invalid currency: xyz".to_string(),
                payment_intent_id: None,
            })
        });
        let (router, state) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json("/create-payment-intent", payment_intent_body("user-1")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": { "message": "Invalid currency: xyz" } })
        );
        assert_eq!(state.last_payment_intent().await, None);
    }

    #[tokio::test]
    async fn test_unknown_gateway_failure_is_500() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_customer().returning(|_| {
            Err(StripeError::ParseError(
                serde_json::from_str::<Value>("{").unwrap_err(),
            ))
        });
        let (router, _) = app(gateway, None);

        let response = router
            .oneshot(post_json("/customer", json!({ "name": "Jenny Rosen" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await["error"]["message"],
            UNKNOWN_ERROR_MESSAGE
        );
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let (_dir, customers) = temp_store().await;
        let (router, _) = app(MockPaymentGateway::new(), Some(customers));

        let request = Request::builder()
            .method("POST")
            .uri("/create-payment-intent")
            .header("content-type", "application/json")
            .body(Body::from("{\"userID\": "))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_user_id_is_400() {
        let (_dir, customers) = temp_store().await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_customer().times(0);
        let (router, _) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json(
                "/create-payment-intent",
                json!({ "currency": "usd", "paymentMethodType": "card" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["message"].as_str().unwrap().contains("userID"));
    }

    #[tokio::test]
    async fn test_store_dependent_endpoints_are_503_without_store() {
        let (router, _) = app(MockPaymentGateway::new(), None);

        let requests = vec![
            post_json("/create-payment-intent", payment_intent_body("user-1")),
            post_json(
                "/charge",
                json!({ "paymentMethodID": "pm_1", "userID": "user-1", "offSession": true }),
            ),
            post_json("/cards", json!({ "userID": "user-1", "type": "card" })),
        ];

        for request in requests {
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    #[tokio::test]
    async fn test_store_read_failure_is_not_a_missing_mapping() {
        let (_dir, customers) = temp_store().await;
        customers
            .add_customer("user-1", "cus_existing")
            .await
            .unwrap();
        customers.client().close().await;

        // No expectations: any gateway call fails the test.
        let (router, _) = app(MockPaymentGateway::new(), Some(customers));

        let requests = vec![
            post_json("/create-payment-intent", payment_intent_body("user-1")),
            post_json(
                "/charge",
                json!({ "paymentMethodID": "pm_1", "userID": "user-1", "offSession": true }),
            ),
            post_json("/cards", json!({ "userID": "user-1", "type": "card" })),
        ];

        for request in requests {
            let response = router.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body_json(response).await,
                json!({ "error": { "message": UNKNOWN_ERROR_MESSAGE } })
            );
        }
    }

    #[tokio::test]
    async fn test_create_customer_returns_id() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_customer()
            .withf(|params| {
                params.name.as_deref() == Some("Jenny Rosen")
                    && params.email.as_deref() == Some("jenny@example.com")
            })
            .times(1)
            .returning(|_| {
                Ok(Customer {
                    id: "cus_42".to_string(),
                    name: Some("Jenny Rosen".to_string()),
                    email: Some("jenny@example.com".to_string()),
                })
            });
        let (router, _) = app(gateway, None);

        let response = router
            .oneshot(post_json(
                "/customer",
                json!({ "name": "Jenny Rosen", "email": "jenny@example.com" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "customerID": "cus_42" }));
    }

    #[tokio::test]
    async fn test_create_invoice_bills_demo_customer() {
        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_invoice_item()
            .withf(|params| {
                params.customer == "cus_Jl6aiT1bRvWZAh"
                    && params.amount == 1999
                    && params.currency == "usd"
            })
            .times(1)
            .returning(|_| {
                Ok(InvoiceItem {
                    id: "ii_1".to_string(),
                    customer: Some("cus_Jl6aiT1bRvWZAh".to_string()),
                    amount: 1999,
                })
            });
        gateway
            .expect_create_invoice()
            .withf(|params| {
                params.customer == "cus_Jl6aiT1bRvWZAh"
                    && params.auto_advance
                    && params.collection_method == "charge_automatically"
            })
            .times(1)
            .returning(|_| {
                Ok(Invoice {
                    id: "in_1".to_string(),
                    customer: None,
                    status: Some("draft".to_string()),
                    charge: None,
                })
            });
        gateway
            .expect_finalize_invoice()
            .withf(|id| id == "in_1")
            .times(1)
            .returning(|_| {
                Ok(Invoice {
                    id: "in_1".to_string(),
                    customer: None,
                    status: Some("open".to_string()),
                    charge: Some("ch_1".to_string()),
                })
            });
        let (router, _) = app(gateway, None);

        let response = router
            .oneshot(empty("POST", "/create-invoice"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_charge_unknown_user_is_404() {
        let (_dir, customers) = temp_store().await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_payment_intent().times(0);
        let (router, _) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json(
                "/charge",
                json!({ "paymentMethodID": "pm_1", "userID": "ghost", "offSession": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_charge_confirms_immediately() {
        let (_dir, customers) = temp_store().await;
        customers.add_customer("user-1", "cus_1").await.unwrap();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_create_payment_intent()
            .withf(|params| {
                params.amount == 1099
                    && params.currency == "usd"
                    && params.customer.as_deref() == Some("cus_1")
                    && params.payment_method.as_deref() == Some("pm_1")
                    && params.confirm == Some(true)
                    && params.off_session == Some(true)
                    && params.error_on_requires_action == Some(true)
            })
            .times(1)
            .returning(|_| Ok(intent("pi_charge", "pi_charge_secret")));
        let (router, _) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json(
                "/charge",
                json!({ "paymentMethodID": "pm_1", "userID": "user-1", "offSession": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "clientSecret": "pi_charge_secret" })
        );
    }

    #[tokio::test]
    async fn test_refused_charge_fetches_the_intent() {
        let (_dir, customers) = temp_store().await;
        customers.add_customer("user-1", "cus_1").await.unwrap();

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_create_payment_intent().returning(|_| {
            Err(StripeError::ApiError {
                status_code: 402,
                code: Some("authentication_required".to_string()),
                message: "This payment requires authentication.".to_string(),
                payment_intent_id: Some("pi_refused".to_string()),
            })
        });
        gateway
            .expect_retrieve_payment_intent()
            .withf(|id| id == "pi_refused")
            .times(1)
            .returning(|id| {
                Ok(PaymentIntent {
                    id: id.to_string(),
                    status: Some("requires_payment_method".to_string()),
                    ..Default::default()
                })
            });
        let (router, _) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json(
                "/charge",
                json!({ "paymentMethodID": "pm_1", "userID": "user-1", "offSession": true }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "This payment requires authentication."
        );
    }

    #[tokio::test]
    async fn test_cards_for_unknown_user_is_empty() {
        let (_dir, customers) = temp_store().await;
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_list_payment_methods().times(0);
        let (router, _) = app(gateway, Some(customers));

        let response = router
            .oneshot(post_json("/cards", json!({ "userID": "ghost", "type": "card" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "cards": [] }));
    }

    #[tokio::test]
    async fn test_cards_lists_saved_cards() {
        let (_dir, customers) = temp_store().await;
        customers.add_customer("user-1", "cus_1").await.unwrap();

        let mut gateway = MockPaymentGateway::new();
        gateway
            .expect_list_payment_methods()
            .withf(|customer_id, method_type| customer_id == "cus_1" && method_type == "card")
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    card("pm_1", "visa", Some("Jenny Rosen")),
                    PaymentMethod {
                        id: "pm_bank".to_string(),
                        method_type: "us_bank_account".to_string(),
                        customer: Some("cus_1".to_string()),
                        card: None,
                        billing_details: BillingDetails::default(),
                    },
                    card("pm_2", "amex", None),
                ])
            });
        let (router, _) = app(gateway, Some(customers));

        // `type` omitted: defaults to card
        let response = router
            .oneshot(post_json("/cards", json!({ "userID": "user-1" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({
                "cards": [
                    {
                        "paymentMethodID": "pm_1",
                        "brand": "visa",
                        "month": 12,
                        "year": 2030,
                        "balanceType": "credit",
                        "cardHolder": "Jenny Rosen",
                        "lastFourDigits": "4242"
                    },
                    {
                        "paymentMethodID": "pm_2",
                        "brand": "amex",
                        "month": 12,
                        "year": 2030,
                        "balanceType": "credit",
                        "cardHolder": "",
                        "lastFourDigits": "4242"
                    }
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_webhook_success_path() {
        let (router, state) = app(MockPaymentGateway::new(), None);
        *state.last_payment_intent.write().await = Some("pi_1".to_string());

        let body = r#"{"type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}}}"#;
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_rejects_oversized_body() {
        let (router, _) = app(MockPaymentGateway::new(), None);

        let padding = "x".repeat(70 * 1024);
        let body = format!(
            r#"{{"type":"payment_intent.succeeded","data":{{"object":{{"id":"pi_1","description":"{}"}}}}}}"#,
            padding
        );
        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from(body))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_webhook_rejects_malformed_body() {
        let (router, _) = app(MockPaymentGateway::new(), None);

        let request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .body(Body::from("not an event"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
