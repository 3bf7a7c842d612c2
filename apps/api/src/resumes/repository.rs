use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::{NewResume, ResumeDetail, ResumeListItem, ResumeRow};

const DETAIL_COLUMNS: &str =
    "id, filename, text, skills, education, experience, file_url, created_at";

pub async fn insert(pool: &PgPool, id: Uuid, resume: NewResume) -> Result<ResumeDetail, sqlx::Error> {
    sqlx::query_as::<_, ResumeDetail>(&format!(
        r#"
        INSERT INTO resumes
            (id, filename, text, skills, education, experience, embeddings, file_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {DETAIL_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&resume.filename)
    .bind(&resume.text)
    .bind(&resume.skills)
    .bind(&resume.education)
    .bind(&resume.experience)
    .bind(&resume.embeddings)
    .bind(&resume.file_url)
    .fetch_one(pool)
    .await
}

/// Resume without embeddings.
pub async fn get_detail(pool: &PgPool, id: Uuid) -> Result<Option<ResumeDetail>, sqlx::Error> {
    sqlx::query_as::<_, ResumeDetail>(&format!(
        "SELECT {DETAIL_COLUMNS} FROM resumes WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn get_row(pool: &PgPool, id: Uuid) -> Result<Option<ResumeRow>, sqlx::Error> {
    sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first.
pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<ResumeListItem>, sqlx::Error> {
    sqlx::query_as::<_, ResumeListItem>(
        r#"
        SELECT id, filename, skills, education, experience, created_at
        FROM resumes
        ORDER BY created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM resumes")
        .fetch_one(pool)
        .await
}

/// Deletes the resume and its matches in one transaction.
/// Returns `false` when no such resume exists.
pub async fn delete_with_matches(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let removed_matches = sqlx::query("DELETE FROM matches WHERE resume_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let removed = sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    tx.commit().await?;
    tracing::info!(resume_id = %id, removed_matches, "Resume deleted");
    Ok(true)
}
