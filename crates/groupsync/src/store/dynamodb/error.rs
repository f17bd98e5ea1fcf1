//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `groupsync_core::store`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use groupsync_core::store::StoreError;

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> StoreError {
    let id_str = id.into();
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => StoreError::NotFound {
            entity_type,
            id: id_str,
        },
        GetItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        GetItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        QueryError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("Query failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> StoreError {
    let id_str = id.into();
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::AlreadyExists {
            entity_type,
            id: id_str,
        },
        PutItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::QueryFailed("Transaction conflict, please retry".to_string())
        }
        PutItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("PutItem failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to StoreError. Conditional failures mean the
/// row the update was conditioned on does not exist.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> StoreError {
    let id_str = id.into();
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => StoreError::NotFound {
            entity_type,
            id: id_str,
        },
        UpdateItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        UpdateItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            StoreError::QueryFailed("Transaction conflict, please retry".to_string())
        }
        UpdateItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
    entity_type: &'static str,
    id: impl Into<String>,
) -> StoreError {
    let id_str = id.into();
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => StoreError::NotFound {
            entity_type,
            id: id_str,
        },
        DeleteItemError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        DeleteItemError::TransactionConflictException(_) => {
            StoreError::QueryFailed("Transaction conflict, please retry".to_string())
        }
        DeleteItemError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("DeleteItem failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to StoreError.
///
/// A cancellation caused by a failed condition is reported as
/// `TransactionCanceled` with the position of the first
/// `ConditionalCheckFailed` reason, so the caller can tell which operation
/// in its batch was rejected.
pub fn map_transact_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
) -> StoreError {
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(e) => {
            let index = e
                .cancellation_reasons()
                .iter()
                .position(|reason| reason.code() == Some("ConditionalCheckFailed"));
            StoreError::TransactionCanceled { index }
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            StoreError::QueryFailed("Table not found".to_string())
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            StoreError::QueryFailed("Throughput exceeded, please retry".to_string())
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            StoreError::QueryFailed("Request limit exceeded, please retry".to_string())
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            StoreError::QueryFailed("Transaction already in progress, please retry".to_string())
        }
        TransactWriteItemsError::IdempotentParameterMismatchException(_) => {
            StoreError::QueryFailed("Idempotent parameter mismatch".to_string())
        }
        TransactWriteItemsError::InternalServerError(_) => {
            StoreError::QueryFailed("DynamoDB internal server error".to_string())
        }
        err => StoreError::QueryFailed(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Map a request builder error to StoreError.
pub fn map_build_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidData(err.to_string())
}
