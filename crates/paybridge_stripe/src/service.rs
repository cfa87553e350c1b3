// --- File: crates/paybridge_stripe/src/service.rs ---
use async_trait::async_trait;

use crate::client::StripeClient;
use crate::error::StripeError;
use crate::models::{
    CreateCustomer, CreateInvoice, CreateInvoiceItem, CreatePaymentIntent, CreateSetupIntent,
    Customer, EphemeralKey, Invoice, InvoiceItem, PaymentIntent, PaymentMethod, SetupIntent,
};

/// The payment gateway operations the HTTP handlers rely on.
///
/// Handlers hold an `Arc<dyn PaymentGateway>` so tests can swap in a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_customer(&self, params: &CreateCustomer) -> Result<Customer, StripeError>;

    async fn create_ephemeral_key(&self, customer_id: &str) -> Result<EphemeralKey, StripeError>;

    async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError>;

    async fn create_setup_intent(
        &self,
        params: &CreateSetupIntent,
    ) -> Result<SetupIntent, StripeError>;

    /// All payment methods of one type for a customer, across every page.
    async fn list_payment_methods(
        &self,
        customer_id: &str,
        method_type: &str,
    ) -> Result<Vec<PaymentMethod>, StripeError>;

    async fn create_invoice_item(
        &self,
        params: &CreateInvoiceItem,
    ) -> Result<InvoiceItem, StripeError>;

    async fn create_invoice(&self, params: &CreateInvoice) -> Result<Invoice, StripeError>;

    async fn finalize_invoice(&self, id: &str) -> Result<Invoice, StripeError>;
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_customer(&self, params: &CreateCustomer) -> Result<Customer, StripeError> {
        StripeClient::create_customer(self, params).await
    }

    async fn create_ephemeral_key(&self, customer_id: &str) -> Result<EphemeralKey, StripeError> {
        StripeClient::create_ephemeral_key(self, customer_id).await
    }

    async fn create_payment_intent(
        &self,
        params: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, StripeError> {
        StripeClient::create_payment_intent(self, params).await
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, StripeError> {
        StripeClient::retrieve_payment_intent(self, id).await
    }

    async fn create_setup_intent(
        &self,
        params: &CreateSetupIntent,
    ) -> Result<SetupIntent, StripeError> {
        StripeClient::create_setup_intent(self, params).await
    }

    async fn list_payment_methods(
        &self,
        customer_id: &str,
        method_type: &str,
    ) -> Result<Vec<PaymentMethod>, StripeError> {
        StripeClient::list_payment_methods(self, customer_id, method_type).await
    }

    async fn create_invoice_item(
        &self,
        params: &CreateInvoiceItem,
    ) -> Result<InvoiceItem, StripeError> {
        StripeClient::create_invoice_item(self, params).await
    }

    async fn create_invoice(&self, params: &CreateInvoice) -> Result<Invoice, StripeError> {
        StripeClient::create_invoice(self, params).await
    }

    async fn finalize_invoice(&self, id: &str) -> Result<Invoice, StripeError> {
        StripeClient::finalize_invoice(self, id).await
    }
}
