use crate::solver::schedule::HORIZON;

/// Extra time past `work_end` granted to drivers with overtime enabled.
pub const OVERTIME_ALLOWANCE: i64 = 7200;

/// A mandatory mid-shift break: `duration` seconds starting anywhere in
/// `[window_start, window_end - duration]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BreakSpec {
    window_start: i64,
    window_end: i64,
    duration: i64,
}

impl BreakSpec {
    pub fn new(window_start: i64, window_end: i64, duration: i64) -> Self {
        BreakSpec {
            window_start,
            window_end,
            duration,
        }
    }

    pub fn window_start(&self) -> i64 {
        self.window_start
    }

    pub fn window_end(&self) -> i64 {
        self.window_end
    }

    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn latest_start(&self) -> i64 {
        self.window_end - self.duration
    }

    /// A break whose window cannot hold its duration is dropped rather than
    /// making the whole route infeasible.
    pub fn fits_window(&self) -> bool {
        self.duration >= 0 && self.latest_start() >= self.window_start
    }
}

/// One driver; each driver is one vehicle to the solver.
#[derive(Debug, Clone)]
pub struct DriverView {
    id: i64,
    name: Option<String>,
    vehicle_id: Option<i64>,
    work_start: Option<i64>,
    work_end: Option<i64>,
    allowed_overtime: bool,
    max_distance_meters: Option<i64>,
    break_spec: Option<BreakSpec>,
    skills: Vec<String>,
}

impl DriverView {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn vehicle_id(&self) -> Option<i64> {
        self.vehicle_id
    }

    pub fn work_start(&self) -> Option<i64> {
        self.work_start
    }

    pub fn work_end(&self) -> Option<i64> {
        self.work_end
    }

    pub fn allowed_overtime(&self) -> bool {
        self.allowed_overtime
    }

    pub fn max_distance_meters(&self) -> Option<i64> {
        self.max_distance_meters
    }

    pub fn break_spec(&self) -> Option<&BreakSpec> {
        self.break_spec.as_ref()
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// Route start is pinned here; drivers without working hours start at
    /// midnight.
    pub fn start_time(&self) -> i64 {
        self.work_start.unwrap_or(0)
    }

    /// Latest allowed return to the depot.
    pub fn latest_end(&self) -> i64 {
        let end = self.work_end.unwrap_or(HORIZON);

        if self.allowed_overtime {
            end + OVERTIME_ALLOWANCE
        } else {
            end
        }
    }

    pub fn shift_length(&self) -> i64 {
        self.latest_end() - self.start_time()
    }

    pub(crate) fn clear_break(&mut self) {
        self.break_spec = None;
    }
}

#[derive(Default)]
pub struct DriverViewBuilder {
    id: Option<i64>,
    name: Option<String>,
    vehicle_id: Option<i64>,
    work_start: Option<i64>,
    work_end: Option<i64>,
    allowed_overtime: Option<bool>,
    max_distance_meters: Option<i64>,
    break_spec: Option<BreakSpec>,
    skills: Option<Vec<String>>,
}

impl DriverViewBuilder {
    pub fn set_id(&mut self, id: i64) -> &mut DriverViewBuilder {
        self.id = Some(id);
        self
    }

    pub fn set_name(&mut self, name: String) -> &mut DriverViewBuilder {
        self.name = Some(name);
        self
    }

    pub fn set_vehicle_id(&mut self, vehicle_id: i64) -> &mut DriverViewBuilder {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    pub fn set_work_hours(&mut self, start: i64, end: i64) -> &mut DriverViewBuilder {
        self.work_start = Some(start);
        self.work_end = Some(end);
        self
    }

    pub fn set_allowed_overtime(&mut self, allowed: bool) -> &mut DriverViewBuilder {
        self.allowed_overtime = Some(allowed);
        self
    }

    pub fn set_max_distance_meters(&mut self, meters: i64) -> &mut DriverViewBuilder {
        self.max_distance_meters = Some(meters);
        self
    }

    pub fn set_break(&mut self, break_spec: BreakSpec) -> &mut DriverViewBuilder {
        self.break_spec = Some(break_spec);
        self
    }

    pub fn set_skills(&mut self, skills: Vec<String>) -> &mut DriverViewBuilder {
        self.skills = Some(skills);
        self
    }

    pub fn build(self) -> DriverView {
        DriverView {
            id: self.id.expect("Driver ID is required"),
            name: self.name,
            vehicle_id: self.vehicle_id,
            work_start: self.work_start,
            work_end: self.work_end,
            allowed_overtime: self.allowed_overtime.unwrap_or(false),
            max_distance_meters: self.max_distance_meters,
            break_spec: self.break_spec,
            skills: self.skills.unwrap_or_default(),
        }
    }
}
