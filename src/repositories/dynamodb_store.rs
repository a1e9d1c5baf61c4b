use async_trait::async_trait;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::{Client as DynamoDbClient, Error as DynamoDbError};
use std::sync::Arc;
use tracing::{error, info, instrument, Instrument};

use super::store::{AttributeFilter, DocumentStore, Item, PARTITION_KEY};
use crate::models::{RepositoryError, RepositoryResult};

/// DynamoDB implementation of the DocumentStore trait
pub struct DynamoDbStore {
    client: Arc<DynamoDbClient>,
    region: String,
}

/// Outcome of a conditional write
enum Conditional {
    Applied,
    Rejected,
}

impl DynamoDbStore {
    pub fn new(client: Arc<DynamoDbClient>, region: String) -> Self {
        Self { client, region }
    }

    /// Create a DynamoDB subsegment span with proper X-Ray attributes
    fn create_dynamodb_span(&self, operation: &str, table: &str) -> tracing::Span {
        tracing::info_span!(
            "DynamoDB",
            "aws.service" = "DynamoDB",
            "aws.operation" = operation,
            "aws.region" = %self.region,
            "aws.dynamodb.table_name" = %table,
            "aws.request_id" = tracing::field::Empty,
            "aws.remote.service" = "AWS::DynamoDB",
            "aws.remote.operation" = operation,
            "aws.remote.resource.type" = "AWS::DynamoDB::Table",
            "aws.remote.resource.identifier" = %table,
            "otel.kind" = "client",
            "otel.name" = format!("DynamoDB.{}", operation),
            "rpc.system" = "aws-api",
            "rpc.service" = "AmazonDynamoDBv2",
            "rpc.method" = operation,
            "http.status_code" = tracing::field::Empty,
            "db.system" = "dynamodb",
            "db.name" = %table,
            "db.operation" = operation,
        )
    }

    fn record_success(request_id: Option<&str>) {
        let span = tracing::Span::current();
        span.record("http.status_code", 200);
        if let Some(request_id) = request_id {
            span.record("aws.request_id", request_id);
        }
    }

    /// Convert DynamoDB error to RepositoryError
    fn map_dynamodb_error(&self, table: &str, error: DynamoDbError) -> RepositoryError {
        error!("DynamoDB error: {:?}", error);
        tracing::Span::current().record("http.status_code", 400);

        match error {
            DynamoDbError::ResourceNotFoundException(_) => RepositoryError::TableNotFound {
                table_name: table.to_string(),
            },
            DynamoDbError::ConditionalCheckFailedException(_) => RepositoryError::Conflict {
                message: "Conditional check failed".to_string(),
            },
            other => RepositoryError::AwsSdk {
                message: other.to_string(),
            },
        }
    }

    async fn conditional_put(
        &self,
        table: &str,
        item: Item,
        condition: &str,
    ) -> RepositoryResult<Conditional> {
        let put_span = self.create_dynamodb_span("PutItem", table);

        async {
            let result = self
                .client
                .put_item()
                .table_name(table)
                .set_item(Some(item))
                .condition_expression(condition)
                .send()
                .await;

            match result {
                Ok(output) => {
                    Self::record_success(output.request_id());
                    Ok(Conditional::Applied)
                }
                Err(e) => match DynamoDbError::from(e) {
                    DynamoDbError::ConditionalCheckFailedException(_) => {
                        info!("Conditional check rejected PutItem");
                        Ok(Conditional::Rejected)
                    }
                    other => Err(self.map_dynamodb_error(table, other)),
                },
            }
        }
        .instrument(put_span)
        .await
    }
}

#[async_trait]
impl DocumentStore for DynamoDbStore {
    #[instrument(skip(self, filter), fields(table = %table))]
    async fn scan(
        &self,
        table: &str,
        filter: Option<AttributeFilter>,
    ) -> RepositoryResult<Vec<Item>> {
        let scan_span = self.create_dynamodb_span("Scan", table);

        async {
            let mut items = Vec::new();
            let mut exclusive_start_key = None;

            // A single Scan call stops at 1MB; keep reading until the table is exhausted
            loop {
                let mut scan_builder = self
                    .client
                    .scan()
                    .table_name(table)
                    .set_exclusive_start_key(exclusive_start_key.take());

                if let Some(filter) = &filter {
                    scan_builder = scan_builder
                        .filter_expression("#attr = :value")
                        .expression_attribute_names("#attr", filter.attribute.clone())
                        .expression_attribute_values(":value", AttributeValue::Bool(filter.value));
                }

                let response = scan_builder
                    .send()
                    .await
                    .map_err(|e| self.map_dynamodb_error(table, e.into()))?;

                Self::record_success(response.request_id());

                if let Some(page) = response.items {
                    items.extend(page);
                }

                match response.last_evaluated_key {
                    Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                    _ => break,
                }
            }

            info!("Scanned {} items", items.len());
            Ok(items)
        }
        .instrument(scan_span)
        .await
    }

    #[instrument(skip(self), fields(table = %table, id = %id))]
    async fn get(&self, table: &str, id: &str) -> RepositoryResult<Option<Item>> {
        let get_span = self.create_dynamodb_span("GetItem", table);

        let response = async {
            let result = self
                .client
                .get_item()
                .table_name(table)
                .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
                .send()
                .await;

            match result {
                Ok(output) => {
                    Self::record_success(output.request_id());
                    Ok(output)
                }
                Err(e) => Err(self.map_dynamodb_error(table, e.into())),
            }
        }
        .instrument(get_span)
        .await?;

        Ok(response.item)
    }

    #[instrument(skip(self, item), fields(table = %table))]
    async fn insert(&self, table: &str, item: Item) -> RepositoryResult<()> {
        match self
            .conditional_put(table, item, "attribute_not_exists(id)")
            .await?
        {
            Conditional::Applied => Ok(()),
            Conditional::Rejected => Err(RepositoryError::Conflict {
                message: format!("An item with this id already exists in {}", table),
            }),
        }
    }

    #[instrument(skip(self, item), fields(table = %table))]
    async fn replace(&self, table: &str, item: Item) -> RepositoryResult<bool> {
        match self
            .conditional_put(table, item, "attribute_exists(id)")
            .await?
        {
            Conditional::Applied => Ok(true),
            Conditional::Rejected => Ok(false),
        }
    }

    #[instrument(skip(self), fields(table = %table, id = %id))]
    async fn remove(&self, table: &str, id: &str) -> RepositoryResult<Option<Item>> {
        let delete_span = self.create_dynamodb_span("DeleteItem", table);

        async {
            let output = self
                .client
                .delete_item()
                .table_name(table)
                .key(PARTITION_KEY, AttributeValue::S(id.to_string()))
                .return_values(ReturnValue::AllOld)
                .send()
                .await
                .map_err(|e| self.map_dynamodb_error(table, e.into()))?;

            Self::record_success(output.request_id());

            // AllOld yields no attributes when nothing was stored under the key
            Ok(output.attributes.filter(|attributes| !attributes.is_empty()))
        }
        .instrument(delete_span)
        .await
    }
}
