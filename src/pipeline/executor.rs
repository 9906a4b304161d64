//! Pipeline executor for extract, clean, load, schema and key installation

use std::time::Instant;

use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::clean::clean;
use crate::config::EtlConfig;
use crate::constraints::{
    PrimaryKeyOutcome, install_primary_key, install_relationship, primary_key_present,
};
use crate::entity::{Entity, FACT_TABLE};
use crate::extract::Extractor;
use crate::schema::{SequenceReport, apply_plan, foreign_keys, plan_for, plan_only, primary_key};
use crate::store::{SchemaExecutor, TableLoader};

use super::error::{PipelineError, PipelineResult};
use super::report::{EntityFailure, EntityReport, IntegrityReport, PipelineReport};

/// Runs entities through the pipeline against one warehouse
pub struct PipelineExecutor<W> {
    config: EtlConfig,
    warehouse: W,
    run_id: String,
}

impl<W> PipelineExecutor<W>
where
    W: SchemaExecutor + TableLoader,
{
    /// Create a new pipeline executor
    pub fn new(config: EtlConfig, warehouse: W) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            warehouse,
            run_id: Uuid::new_v4().to_string(),
        })
    }

    /// Identifier shared by every report of this executor
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn warehouse(&self) -> &W {
        &self.warehouse
    }

    pub fn warehouse_mut(&mut self) -> &mut W {
        &mut self.warehouse
    }

    /// Consume the executor, returning the warehouse
    pub fn into_warehouse(self) -> W {
        self.warehouse
    }

    /// Validated statements for an entity's schema plan
    pub fn plan(entity: Entity) -> PipelineResult<SequenceReport> {
        Ok(plan_only(&plan_for(entity))?)
    }

    /// Extract, clean, load and type one entity, then install its primary key
    ///
    /// Extract failures and the store cleaner's missing columns abort the
    /// entity. Failed schema statements are recorded on the report.
    pub fn run_entity(
        &mut self,
        entity: Entity,
        extractor: &dyn Extractor,
    ) -> PipelineResult<EntityReport> {
        let _span = info_span!(
            "pipeline_entity",
            run_id = %self.run_id,
            entity = %entity,
            dry_run = self.config.dry_run
        )
        .entered();
        let start = Instant::now();

        let raw = extractor
            .extract(entity)
            .map_err(|source| PipelineError::Extract { entity, source })?;
        let cleaned = clean(entity, raw)?;
        let plan = plan_for(entity);
        let key = primary_key(entity);

        let (rows_loaded, schema, pk_outcome, pk_present) = if self.config.dry_run {
            info!(entity = %entity, "Dry run, skipping warehouse writes");
            (
                None,
                plan_only(&plan)?,
                key.as_ref().map(|spec| PrimaryKeyOutcome::Planned {
                    sql: spec.statement(),
                }),
                None,
            )
        } else {
            let rows = self.warehouse.load_table(entity.table(), &cleaned.table)?;
            let schema = apply_plan(&mut self.warehouse, &plan)?;
            let outcome = key
                .as_ref()
                .map(|spec| install_primary_key(&mut self.warehouse, spec));
            let present = key
                .as_ref()
                .map(|spec| primary_key_present(&mut self.warehouse, spec));
            (Some(rows), schema, outcome, present)
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            entity = %entity,
            table = entity.table(),
            rows_in = cleaned.report.rows_in,
            rows_out = cleaned.report.rows_out,
            statements_failed = schema.failures().count(),
            duration_ms,
            "Entity completed"
        );

        Ok(EntityReport {
            run_id: self.run_id.clone(),
            entity,
            table: entity.table().to_string(),
            dry_run: self.config.dry_run,
            cleaning: cleaned.report,
            rows_loaded,
            schema,
            primary_key: pk_outcome,
            primary_key_present: pk_present,
            duration_ms,
        })
    }

    /// Prune orphans and add a foreign key from the fact table to each dimension
    ///
    /// Nothing is attempted unless the fact table and every dimension exist.
    pub fn install_referential_integrity(&mut self) -> PipelineResult<IntegrityReport> {
        let specs = foreign_keys();
        let mut report = IntegrityReport {
            run_id: self.run_id.clone(),
            missing_tables: Vec::new(),
            relationships: Vec::new(),
            planned: Vec::new(),
        };

        if self.config.dry_run {
            for spec in &specs {
                if self.config.prunes(&spec.column) {
                    report.planned.push(spec.prune_statement());
                }
                report.planned.push(spec.statement());
            }
            return Ok(report);
        }

        let required = std::iter::once(FACT_TABLE)
            .chain(Entity::DIMENSIONS.iter().map(|d| d.table()));
        for table in required {
            if !self.warehouse.table_exists(table)? {
                report.missing_tables.push(table.to_string());
            }
        }
        if report.skipped() {
            warn!(
                missing = ?report.missing_tables,
                "Skipping foreign keys until every table is loaded"
            );
            return Ok(report);
        }

        for spec in &specs {
            let prune = self.config.prunes(&spec.column);
            report
                .relationships
                .push(install_relationship(&mut self.warehouse, spec, prune));
        }

        info!(
            installed = report.installed(),
            relationships = report.relationships.len(),
            "Referential integrity pass finished"
        );
        Ok(report)
    }

    /// Run every entity, dimensions first, then install foreign keys
    ///
    /// An entity that aborts is recorded and the next entity still runs.
    pub fn run_all(&mut self, extractor: &dyn Extractor) -> PipelineResult<PipelineReport> {
        let _span = info_span!(
            "pipeline_run",
            run_id = %self.run_id,
            dry_run = self.config.dry_run
        )
        .entered();
        let start = Instant::now();

        info!(
            run_id = %self.run_id,
            entities = ?Entity::ALL.iter().map(|e| e.name()).collect::<Vec<_>>(),
            "Starting pipeline"
        );

        let mut entities = Vec::new();
        let mut failures = Vec::new();
        for entity in Entity::ALL {
            match self.run_entity(entity, extractor) {
                Ok(report) => entities.push(report),
                Err(e) => {
                    error!(entity = %entity, error = %e, "Entity aborted");
                    failures.push(EntityFailure {
                        entity,
                        error: e.to_string(),
                    });
                }
            }
        }

        let integrity = self.install_referential_integrity()?;
        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            run_id = %self.run_id,
            duration_ms,
            loaded = entities.len(),
            failed = failures.len(),
            "Pipeline completed"
        );

        Ok(PipelineReport {
            run_id: self.run_id.clone(),
            entities,
            failures,
            integrity,
            duration_ms,
        })
    }
}
