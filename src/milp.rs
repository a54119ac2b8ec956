//! Formulation of the timetabling problem as a binary integer program.
//!
//! Two families of decision variables are created: `assignment[s, c, t]`
//! (student `s` takes course `c` in term `t`) and `scheduled[c, d, t]`
//! (course `c` occupies day `d` in term `t`). Scheduling is decided at
//! day granularity only; the three times of day are collapsed to keep the
//! block dimension at 5 per term instead of 15. The builder lives for
//! exactly one run: it is created, solved, read out and dropped.

use std::collections::{BTreeMap, BTreeSet};

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Solution, Variable};
use log::{debug, info};

use crate::engine::{self, RunConfig};
use crate::model::InputModel;
use crate::{Course, Day, Error, Term};

/// Big-M constant linking enrollment to scheduled blocks.
const BIG_M: f64 = 1000.0;

/// Minimum enrollment a course needs before a block may be scheduled for it.
/// The roster minimum is relaxed by two students, but never below one.
fn enrollment_threshold(course: &Course) -> f64 {
    std::cmp::max(1, course.min_size.saturating_sub(2)) as f64
}

/// The solved decision variables of one run, keyed by entity ids so the
/// extraction step needs no access to solver internals.
#[derive(Debug, Clone)]
pub struct MilpSolution {
    /// Objective value of the accepted incumbent
    pub objective: f64,
    /// Engine outcome that produced this solution
    pub status: String,
    /// Codes of all courses that entered the model, sorted
    pub active_courses: Vec<String>,
    /// All true `assignment` variables as (student, course, term)
    pub enrollments: BTreeSet<(String, String, Term)>,
    /// All true `scheduled` variables as (course, day, term)
    pub scheduled: BTreeSet<(String, Day, Term)>,
}

impl MilpSolution {
    /// Number of students enrolled in a course during a term.
    pub fn enrolled_count(&self, course: &str, term: Term) -> usize {
        self.enrollments
            .iter()
            .filter(|(_, c, t)| c == course && *t == term)
            .count()
    }

    /// Days on which a course is scheduled during a term, in calendar order.
    pub fn scheduled_days(&self, course: &str, term: Term) -> Vec<Day> {
        self.scheduled
            .iter()
            .filter(|(c, _, t)| c == course && *t == term)
            .map(|(_, d, _)| *d)
            .collect()
    }
}

/// Formulate and solve the timetabling problem for one input snapshot.
pub fn solve(model: &InputModel, config: &RunConfig) -> Result<MilpSolution, Error> {
    ProblemBuilder::new(model)?.solve(config)
}

/// Per-run holder of the decision variables and their index maps.
struct ProblemBuilder<'a> {
    model: &'a InputModel,
    vars: ProblemVariables,
    /// Codes of courses with at least one requesting student, sorted
    active: Vec<String>,
    /// `assignment` variable per valid (student, course) pair and term
    assignment: BTreeMap<(String, String, Term), Variable>,
    /// `scheduled` variable per active course, day and term
    scheduled: BTreeMap<(String, Day, Term), Variable>,
    /// Assignment variables of one (student, course) pair across both terms
    pair_vars: BTreeMap<(String, String), Vec<Variable>>,
    /// Assignment variables of one course and term across all its students
    enrolled_vars: BTreeMap<(String, Term), Vec<Variable>>,
    /// Scheduling variables of one course and term across all days
    day_vars: BTreeMap<(String, Term), Vec<Variable>>,
}

impl<'a> ProblemBuilder<'a> {
    /// Derive the variable domain from the model: only courses with at least
    /// one requesting student become part of the problem, and assignment
    /// variables exist only for pairs that are actually requested. This
    /// pruning is what keeps the problem tractable for real rosters.
    fn new(model: &'a InputModel) -> Result<ProblemBuilder<'a>, Error> {
        let mut request_counts: BTreeMap<&str, usize> = BTreeMap::new();
        let mut valid_pairs: BTreeSet<(&str, &str)> = BTreeSet::new();
        for student in &model.students {
            for request in &student.requests {
                if let Some(course) = model.courses.get(&request.course) {
                    *request_counts.entry(course.code.as_str()).or_insert(0) += 1;
                    valid_pairs.insert((student.id.as_str(), course.code.as_str()));
                }
            }
        }
        if valid_pairs.is_empty() {
            return Err(Error::EmptyProblem(
                "no student request matches the course catalog".into(),
            ));
        }

        let active: Vec<String> = request_counts.keys().map(|c| c.to_string()).collect();
        info!(
            "{} of {} courses are active, {} valid (student, course) pairs",
            active.len(),
            model.courses.len(),
            valid_pairs.len()
        );
        let mut by_demand: Vec<(&str, usize)> =
            request_counts.iter().map(|(c, n)| (*c, *n)).collect();
        by_demand.sort_by(|a, b| b.1.cmp(&a.1));
        for (course, requests) in by_demand.iter().take(5) {
            debug!("{} requests for course {}", requests, course);
        }

        let mut vars = ProblemVariables::new();
        let mut assignment = BTreeMap::new();
        let mut pair_vars: BTreeMap<(String, String), Vec<Variable>> = BTreeMap::new();
        let mut enrolled_vars: BTreeMap<(String, Term), Vec<Variable>> = BTreeMap::new();
        for (student, course) in &valid_pairs {
            for term in Term::BOTH.iter().copied() {
                let var = vars.add(variable().binary());
                assignment.insert((student.to_string(), course.to_string(), term), var);
                pair_vars
                    .entry((student.to_string(), course.to_string()))
                    .or_default()
                    .push(var);
                enrolled_vars
                    .entry((course.to_string(), term))
                    .or_default()
                    .push(var);
            }
        }

        let mut scheduled = BTreeMap::new();
        let mut day_vars: BTreeMap<(String, Term), Vec<Variable>> = BTreeMap::new();
        for course in &active {
            for day in Day::ALL.iter().copied() {
                for term in Term::BOTH.iter().copied() {
                    let var = vars.add(variable().binary());
                    scheduled.insert((course.clone(), day, term), var);
                    day_vars.entry((course.clone(), term)).or_default().push(var);
                }
            }
        }
        info!(
            "Created {} assignment and {} scheduling variables",
            assignment.len(),
            scheduled.len()
        );

        Ok(ProblemBuilder {
            model,
            vars,
            active,
            assignment,
            scheduled,
            pair_vars,
            enrolled_vars,
            day_vars,
        })
    }

    fn weight_of(&self, course: &str) -> f64 {
        self.model
            .courses
            .get(course)
            .map(|c| c.priority.weight())
            .unwrap_or(0.0)
    }

    /// Maximize the weighted number of satisfied course requests.
    fn objective(&self) -> Expression {
        self.assignment
            .iter()
            .map(|((_, course, _), var)| self.weight_of(course) * *var)
            .sum()
    }

    fn constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();

        // A student takes a course in at most one of the two terms.
        for vars in self.pair_vars.values() {
            let taken: Expression = vars.iter().copied().sum();
            constraints.push(constraint!(taken <= 1));
        }

        for course_code in &self.active {
            let course = &self.model.courses[course_code];
            let capacity = (course.max_size * course.sections) as f64;
            let threshold = enrollment_threshold(course);
            for term in Term::BOTH.iter().copied() {
                let key = (course_code.clone(), term);
                let enrolled: Expression = self.enrolled_vars[&key].iter().copied().sum();
                let blocks: Expression = self.day_vars[&key].iter().copied().sum();

                // Total enrollment never exceeds the section capacity.
                constraints.push(constraint!(enrolled.clone() <= capacity));

                // Enrollment and scheduled blocks imply each other: no block
                // without the minimum viable enrollment, no enrollment
                // without at least one block.
                constraints.push(constraint!(enrolled.clone() >= threshold * blocks.clone()));
                constraints.push(constraint!(enrolled <= BIG_M * blocks.clone()));

                // A course occupies at most as many days as it has sections.
                constraints.push(constraint!(blocks <= course.sections as f64));
            }
        }

        // A lecturer teaches at most one of their courses per day and term.
        for lecturer in &self.model.lecturers {
            let taught: Vec<&String> = self
                .active
                .iter()
                .filter(|c| lecturer.courses.contains(c.as_str()))
                .collect();
            if taught.len() < 2 {
                continue;
            }
            for day in Day::ALL.iter().copied() {
                for term in Term::BOTH.iter().copied() {
                    let busy: Expression = taught
                        .iter()
                        .map(|c| self.scheduled[&((*c).clone(), day, term)])
                        .sum();
                    constraints.push(constraint!(busy <= 1));
                }
            }
        }

        constraints
    }

    /// Run the engine and read the incumbent back into id space.
    fn solve(self, config: &RunConfig) -> Result<MilpSolution, Error> {
        let objective = self.objective();
        let constraints = self.constraints();

        let ProblemBuilder {
            model,
            vars,
            active,
            assignment,
            scheduled,
            ..
        } = self;

        let solution = engine::run(vars, objective, constraints, config)?;

        let mut enrollments = BTreeSet::new();
        let mut objective_value = 0.0;
        for ((student, course, term), var) in &assignment {
            if solution.value(*var) > 0.5 {
                objective_value += model
                    .courses
                    .get(course)
                    .map(|c| c.priority.weight())
                    .unwrap_or(0.0);
                enrollments.insert((student.clone(), course.clone(), *term));
            }
        }

        let mut chosen_blocks = BTreeSet::new();
        for ((course, day, term), var) in &scheduled {
            if solution.value(*var) > 0.5 {
                chosen_blocks.insert((course.clone(), *day, *term));
            }
        }

        info!(
            "Accepted schedule: objective {}, {} enrollments, {} scheduled blocks",
            objective_value,
            enrollments.len(),
            chosen_blocks.len()
        );

        Ok(MilpSolution {
            objective: objective_value,
            status: config.status_line(),
            active_courses: active,
            enrollments,
            scheduled: chosen_blocks,
        })
    }
}
