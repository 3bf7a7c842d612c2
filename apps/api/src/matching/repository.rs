use sqlx::PgPool;
use uuid::Uuid;

use crate::models::matching::{JobDescriptionRow, MatchDetail, MatchListItem, MatchRow};

/// Stores a job description and its match in one transaction.
pub async fn insert_job_and_match(
    pool: &PgPool,
    resume_id: Uuid,
    jd_text: &str,
    jd_skills: &[String],
    match_score: f64,
    missing_skills: &[String],
) -> Result<(JobDescriptionRow, MatchRow), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let job = sqlx::query_as::<_, JobDescriptionRow>(
        "INSERT INTO job_descriptions (id, text, skills) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(jd_text)
    .bind(jd_skills)
    .fetch_one(&mut *tx)
    .await?;

    let matched = sqlx::query_as::<_, MatchRow>(
        r#"
        INSERT INTO matches (id, resume_id, jd_id, match_score, missing_skills)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resume_id)
    .bind(job.id)
    .bind(match_score)
    .bind(missing_skills)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok((job, matched))
}

/// Newest first, with job description and resume filename.
pub async fn list(pool: &PgPool) -> Result<Vec<MatchListItem>, sqlx::Error> {
    sqlx::query_as::<_, MatchListItem>(
        r#"
        SELECT m.id, m.resume_id, r.filename AS resume_filename,
               j.text AS jd_text, j.skills AS jd_skills,
               m.match_score, m.missing_skills, m.created_at
        FROM matches m
        JOIN job_descriptions j ON j.id = m.jd_id
        LEFT JOIN resumes r ON r.id = m.resume_id
        ORDER BY m.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_detail(pool: &PgPool, id: Uuid) -> Result<Option<MatchDetail>, sqlx::Error> {
    sqlx::query_as::<_, MatchDetail>(
        r#"
        SELECT m.id, m.resume_id, r.filename AS resume_filename,
               COALESCE(r.skills, '{}') AS resume_skills,
               j.text AS jd_text, j.skills AS jd_skills,
               m.match_score, m.missing_skills, m.created_at
        FROM matches m
        JOIN job_descriptions j ON j.id = m.jd_id
        LEFT JOIN resumes r ON r.id = m.resume_id
        WHERE m.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Returns `false` when no such match exists.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM matches WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(removed > 0)
}

pub async fn all_scores(pool: &PgPool) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar("SELECT match_score FROM matches")
        .fetch_all(pool)
        .await
}
